use anyhow::Context;
use chrono::{Duration, Utc};
use serde_json::json;

use crate::auth::{issue_token, Claims, SubjectId};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::AppConfig;

pub fn handle(
    config: &AppConfig,
    subject: &str,
    email: Option<String>,
    hours: Option<i64>,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let secret = config
        .security
        .jwt_secret
        .as_deref()
        .context("JWT_SECRET must be set to mint tokens")?;

    let hours = match hours {
        Some(hours) => hours,
        None => i64::try_from(config.security.jwt_expiry_hours).context("JWT_EXPIRY_HOURS is out of range")?,
    };
    let claims = Claims::new(parse_subject(subject), email, lifetime(hours)?);
    let token = issue_token(secret, &claims)?;

    match output_format {
        OutputFormat::Json => output_success(
            &output_format,
            "token issued",
            Some(json!({ "token": token, "claims": claims })),
        ),
        OutputFormat::Text => {
            println!("{}", token);
            Ok(())
        }
    }
}

/// Token lifetime, refusing values whose expiry cannot be represented
fn lifetime(hours: i64) -> anyhow::Result<Duration> {
    Duration::try_hours(hours)
        .filter(|ttl| Utc::now().checked_add_signed(*ttl).is_some())
        .with_context(|| format!("token lifetime of {} hours is out of range", hours))
}

/// Numeric subjects match what the auth service signs
fn parse_subject(subject: &str) -> SubjectId {
    subject
        .parse::<i64>()
        .map(SubjectId::Number)
        .unwrap_or_else(|_| SubjectId::Text(subject.to_string()))
}
