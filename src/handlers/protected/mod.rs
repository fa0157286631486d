// handlers/protected/mod.rs - Handlers behind jwt_auth_middleware
//
// Only routes the gateway answers itself live here; protected upstream
// routes are authenticated inside handlers::gateway.

use axum::{extract::Extension, response::Json};
use serde_json::{json, Value};

use crate::middleware::AuthUser;

/// GET /api/user/profile - Echo the verified claims back to the caller
///
/// ```json
/// {
///   "message": "protected route access granted",
///   "user": { "id": 1, "email": "user@example.com", "iat": 1700000000, "exp": 1700028800 }
/// }
/// ```
pub async fn profile(Extension(user): Extension<AuthUser>) -> Json<Value> {
    Json(json!({
        "message": "protected route access granted",
        "user": user,
    }))
}
