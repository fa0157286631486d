// Gateway-side error envelope
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::auth::AuthError;
use crate::proxy::DispatchError;
use crate::routes::RouteError;

/// Every failure the gateway answers for itself, as opposed to relaying an upstream response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    // 400 Bad Request
    InvalidJson(String),
    BadRequest(String),

    // 401 Unauthorized
    TokenNotProvided,
    TokenExpired,

    // 403 Forbidden
    InvalidToken,

    // 404 Not Found
    NotFound,

    // 413 Payload Too Large
    PayloadTooLarge { limit: usize },

    // 500 Internal Server Error
    ServerMisconfigured,

    // 502 Bad Gateway
    UpstreamUnreachable { service: String },
}

impl GatewayError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::InvalidJson(_) | GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::TokenNotProvided | GatewayError::TokenExpired => StatusCode::UNAUTHORIZED,
            GatewayError::InvalidToken => StatusCode::FORBIDDEN,
            GatewayError::NotFound => StatusCode::NOT_FOUND,
            GatewayError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::ServerMisconfigured => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::UpstreamUnreachable { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    /// Client-facing `error` field
    pub fn message(&self) -> &'static str {
        match self {
            GatewayError::InvalidJson(_) => "invalid JSON body",
            GatewayError::BadRequest(_) => "bad request",
            GatewayError::TokenNotProvided => "token not provided",
            GatewayError::TokenExpired => "token expired",
            GatewayError::InvalidToken => "invalid token",
            GatewayError::NotFound => "not found",
            GatewayError::PayloadTooLarge { .. } => "payload too large",
            GatewayError::ServerMisconfigured => "internal server configuration error",
            GatewayError::UpstreamUnreachable { .. } => "Bad Gateway",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        match self {
            GatewayError::UpstreamUnreachable { service } => json!({
                "error": self.message(),
                "message": format!("{} unreachable", service),
            }),
            _ => json!({ "error": self.message() }),
        }
    }
}

impl From<AuthError> for GatewayError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingHeader | AuthError::NotBearer => GatewayError::TokenNotProvided,
            AuthError::Expired => GatewayError::TokenExpired,
            AuthError::Malformed(_) => GatewayError::InvalidToken,
            AuthError::ServerMisconfigured | AuthError::Signing(_) => GatewayError::ServerMisconfigured,
        }
    }
}

impl From<RouteError> for GatewayError {
    fn from(err: RouteError) -> Self {
        match err {
            RouteError::NoRoute { .. } => GatewayError::NotFound,
        }
    }
}

impl From<DispatchError> for GatewayError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::Unreachable { service, .. } => GatewayError::UpstreamUnreachable { service },
            DispatchError::PayloadTooLarge { limit } => GatewayError::PayloadTooLarge { limit },
            DispatchError::InvalidJson(msg) => GatewayError::InvalidJson(msg),
            DispatchError::ReadBody(msg) => GatewayError::BadRequest(msg),
            DispatchError::InvalidIdentity => GatewayError::InvalidToken,
        }
    }
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GatewayError::InvalidJson(detail) | GatewayError::BadRequest(detail) => {
                write!(f, "{}: {}", self.message(), detail)
            }
            GatewayError::PayloadTooLarge { limit } => write!(f, "{} (limit {} bytes)", self.message(), limit),
            GatewayError::UpstreamUnreachable { service } => write!(f, "{} unreachable", service),
            _ => f.write_str(self.message()),
        }
    }
}

impl std::error::Error for GatewayError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for GatewayError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}
