// app.rs - Router assembly and shared request state
//
// Public (no auth) → gateway-local protected routes → everything else through
// the route table.

use std::sync::Arc;

use anyhow::Context;
use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::get,
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::TokenVerifier;
use crate::config::AppConfig;
use crate::handlers;
use crate::middleware::jwt_auth_middleware;
use crate::proxy::Dispatcher;
use crate::routes::{suite::suite_routes, RouteTable};

/// Immutable per-process state shared by every request
pub struct AppState {
    pub verifier: TokenVerifier,
    pub routes: RouteTable,
    pub dispatcher: Dispatcher,
}

impl AppState {
    pub fn new(verifier: TokenVerifier, routes: RouteTable, dispatcher: Dispatcher) -> Self {
        Self {
            verifier,
            routes,
            dispatcher,
        }
    }

    /// State for the suite's route table.
    ///
    /// Does not validate the config; a missing secret surfaces as a 500 per request.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let routes = suite_routes(&config.upstreams).context("invalid route table")?;
        let dispatcher =
            Dispatcher::new(&config.upstreams, &config.server).context("failed to build upstream HTTP client")?;

        Ok(Self::new(
            TokenVerifier::new(config.security.jwt_secret.as_deref()),
            routes,
            dispatcher,
        ))
    }
}

pub fn app(state: Arc<AppState>, cors_origins: &[String]) -> Router {
    Router::new()
        // Public
        .route("/", get(handlers::public::root))
        .route("/health", get(handlers::public::health))
        // Served by the gateway itself
        .merge(profile_routes(state.clone()))
        // Everything else goes through the route table
        .fallback(handlers::gateway::dispatch)
        .with_state(state)
        // Global middleware
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
}

fn profile_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    // Auth wraps only the GET endpoint; other methods get the 404 envelope unauthenticated
    Router::new().route(
        "/api/user/profile",
        get(handlers::protected::profile)
            .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
            .fallback(handlers::gateway::unmapped_method),
    )
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
