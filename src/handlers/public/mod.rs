// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Gateway-local endpoints used for liveness checks and discovery. Token
// acquisition (/api/auth/*) is public too, but is proxied to the auth service
// through the route table rather than served here.

use std::sync::Arc;

use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::app::AppState;

/// GET / - Gateway name, version and the routes it forwards
pub async fn root(State(state): State<Arc<AppState>>) -> Json<Value> {
    let routes: Vec<Value> = state
        .routes
        .entries()
        .iter()
        .map(|entry| {
            json!({
                "methods": entry.methods.to_string(),
                "path": entry.pattern.as_str(),
                "service": entry.upstream.name,
                "access": entry.access,
            })
        })
        .collect();

    Json(json!({
        "name": "suite-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "routes": routes,
    }))
}

/// GET /health - Liveness only; upstreams are not probed
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
    }))
}
