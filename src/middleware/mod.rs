pub mod auth;
pub mod identity;

pub use auth::{authenticate, jwt_auth_middleware, AuthUser};
pub use identity::{attach_identity, identity_value, strip_identity, USER_ID_HEADER};
