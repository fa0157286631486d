// Trusted identity header written on every outbound call.
//
// Upstream services accept x-user-id without re-verifying it, so any value the
// client sent is dropped before the gateway writes its own.

use axum::http::{HeaderMap, HeaderName, HeaderValue};

use super::auth::AuthUser;
use crate::error::GatewayError;

pub const USER_ID_HEADER: HeaderName = HeaderName::from_static("x-user-id");

/// Remove client-supplied identity headers.
pub fn strip_identity(headers: &mut HeaderMap) {
    if headers.remove(&USER_ID_HEADER).is_some() {
        tracing::warn!("dropped client-supplied {} header", USER_ID_HEADER);
    }
}

/// The verified subject as an `x-user-id` value.
///
/// A string subject with bytes a header cannot carry has no representation
/// upstream, so the caller is treated as unauthenticated.
pub fn identity_value(user: &AuthUser) -> Result<HeaderValue, GatewayError> {
    HeaderValue::from_str(&user.id.to_string()).map_err(|_| {
        tracing::warn!(subject = ?user.id.to_string(), "subject is not a valid header value");
        GatewayError::InvalidToken
    })
}

/// Replace any identity header with the verified subject.
pub fn attach_identity(user: &AuthUser, headers: &mut HeaderMap) -> Result<(), GatewayError> {
    let value = identity_value(user)?;
    strip_identity(headers);
    headers.insert(USER_ID_HEADER, value);
    Ok(())
}
