use std::fmt;

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Subject identifier carried in the `id` claim.
///
/// The auth service signs numeric database ids, but string subjects are
/// accepted so other issuers can share the secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubjectId {
    Number(i64),
    Text(String),
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubjectId::Number(id) => write!(f, "{}", id),
            SubjectId::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for SubjectId {
    fn from(id: i64) -> Self {
        SubjectId::Number(id)
    }
}

impl From<&str> for SubjectId {
    fn from(id: &str) -> Self {
        SubjectId::Text(id.to_string())
    }
}

/// Identity claim set produced by a successful verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawClaims")]
pub struct Claims {
    pub id: SubjectId,
    pub email: Option<String>,
    pub iat: Option<i64>,
    pub exp: i64,
}

/// Wire form: the subject may arrive as `id`, `sub`, or both
#[derive(Deserialize)]
struct RawClaims {
    #[serde(default)]
    id: Option<SubjectId>,
    #[serde(default)]
    sub: Option<SubjectId>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    iat: Option<i64>,
    exp: i64,
}

impl TryFrom<RawClaims> for Claims {
    type Error = String;

    fn try_from(raw: RawClaims) -> Result<Self, Self::Error> {
        // `id` is what the auth service signs; `sub` is the registered fallback
        let id = raw.id.or(raw.sub).ok_or("token carries neither `id` nor `sub`")?;
        Ok(Self {
            id,
            email: raw.email,
            iat: raw.iat,
            exp: raw.exp,
        })
    }
}

impl Claims {
    pub fn new(id: SubjectId, email: Option<String>, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id,
            email,
            iat: Some(now.timestamp()),
            exp: (now + ttl).timestamp(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("verification secret is not configured")]
    ServerMisconfigured,

    #[error("authorization header missing")]
    MissingHeader,

    #[error("authorization header is not a bearer credential")]
    NotBearer,

    #[error("token expired")]
    Expired,

    #[error("token rejected: {0}")]
    Malformed(String),

    #[error("token signing failed: {0}")]
    Signing(String),
}

/// Validates `Authorization: Bearer <token>` credentials against the shared secret.
///
/// Holds no per-request state; one instance is shared by every request.
#[derive(Clone)]
pub struct TokenVerifier {
    key: Option<DecodingKey>,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp"]);
        // Expiry is exact; a token past `exp` is expired
        validation.leeway = 0;

        Self {
            key: secret.map(|s| DecodingKey::from_secret(s.as_bytes())),
            validation,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.key.is_some()
    }

    /// Verify the raw `Authorization` header value.
    pub fn verify(&self, authorization: Option<&str>) -> Result<Claims, AuthError> {
        let Some(key) = &self.key else {
            tracing::error!("JWT secret is not configured; rejecting request");
            return Err(AuthError::ServerMisconfigured);
        };

        let token = extract_bearer(authorization)?;

        match decode::<Claims>(token, key, &self.validation) {
            Ok(data) => {
                tracing::debug!(
                    subject = %data.claims.id,
                    email = data.claims.email.as_deref().unwrap_or("-"),
                    "token verified"
                );
                Ok(data.claims)
            }
            Err(e) => {
                let err = match e.kind() {
                    ErrorKind::ExpiredSignature => AuthError::Expired,
                    _ => AuthError::Malformed(e.to_string()),
                };
                tracing::warn!(error = %err, "token verification failed");
                Err(err)
            }
        }
    }
}

/// Pull the token out of a `Bearer <token>` header value
fn extract_bearer(authorization: Option<&str>) -> Result<&str, AuthError> {
    let header = authorization.ok_or_else(|| {
        tracing::warn!("authorization header missing");
        AuthError::MissingHeader
    })?;

    let token = header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            tracing::warn!("authorization header is not in Bearer format");
            AuthError::NotBearer
        })?;

    Ok(token)
}

/// Sign a token the same way the auth service does (HS256).
pub fn issue_token(secret: &str, claims: &Claims) -> Result<String, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::ServerMisconfigured);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key).map_err(|e| AuthError::Signing(e.to_string()))
}
