use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use serde::Serialize;

use crate::app::AppState;
use crate::auth::{Claims, SubjectId, TokenVerifier};
use crate::error::GatewayError;
use crate::middleware::identity::identity_value;

/// Authenticated caller extracted from a verified token
#[derive(Clone, Debug, Serialize)]
pub struct AuthUser {
    pub id: SubjectId,
    pub email: Option<String>,
    pub iat: Option<i64>,
    pub exp: i64,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.id,
            email: claims.email,
            iat: claims.iat,
            exp: claims.exp,
        }
    }
}

/// Verify the request's bearer credential and return the caller.
pub fn authenticate(verifier: &TokenVerifier, headers: &HeaderMap) -> Result<AuthUser, GatewayError> {
    // A non-UTF8 header value cannot be a bearer token
    let authorization = headers
        .get(AUTHORIZATION)
        .map(|value| value.to_str().unwrap_or_default());

    let claims = verifier.verify(authorization)?;
    let user = AuthUser::from(claims);
    // Reject subjects that could not be forwarded as x-user-id
    identity_value(&user)?;
    Ok(user)
}

/// JWT authentication middleware for routes the gateway serves itself
pub async fn jwt_auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    let auth_user = authenticate(&state.verifier, request.headers())?;
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}
