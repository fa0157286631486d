// handlers/gateway.rs - Catch-all handler for every proxied route
//
// resolve route → authenticate (protected only) → attach identity → forward.
// Any failure short-circuits into a GatewayError envelope; an upstream
// response, whatever its status, is returned as-is.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    response::Response,
};

use crate::app::AppState;
use crate::error::GatewayError;
use crate::middleware::authenticate;
use crate::routes::Access;

pub async fn dispatch(State(state): State<Arc<AppState>>, request: Request) -> Result<Response, GatewayError> {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let route = state.routes.resolve(&method, &path).map_err(|e| {
        if state.routes.knows_path(&path) {
            tracing::warn!(%method, %path, "no route for method on a mapped path");
        } else {
            tracing::warn!(%method, %path, error = %e, "no route configured");
        }
        GatewayError::from(e)
    })?;

    let user = match route.entry.access {
        Access::Protected => Some(authenticate(&state.verifier, request.headers()).map_err(|e| {
            tracing::info!(%method, %path, service = route.service(), status = e.status_code().as_u16(), "request rejected");
            e
        })?),
        Access::Public => None,
    };

    let response = state
        .dispatcher
        .forward(&route, request, user.as_ref())
        .await
        .map_err(|e| {
            let err = GatewayError::from(e);
            tracing::info!(%method, %path, service = route.service(), error = %err, "request failed at gateway");
            err
        })?;

    Ok(response)
}

/// Method fallback for gateway-local routes, matching the table's 404 for unmapped methods
pub async fn unmapped_method(request: Request) -> GatewayError {
    tracing::warn!(method = %request.method(), path = %request.uri().path(), "no route for method on a mapped path");
    GatewayError::NotFound
}
