use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub security: SecurityConfig,
    pub upstreams: UpstreamConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub max_json_body_bytes: usize,
    pub max_upload_body_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// HS256 secret shared with the auth service. `None` when unset.
    #[serde(skip_serializing)]
    pub jwt_secret: Option<String>,
    pub jwt_expiry_hours: u64,
}

/// Base URLs of the services the gateway fronts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    pub auth: String,
    pub notes: String,
    pub whiteboards: String,
    pub tasks: String,
    pub pdf_tools: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl UpstreamConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// (env var, value) pairs, used for validation and diagnostics
    pub fn named_urls(&self) -> [(&'static str, &str); 5] {
        [
            ("AUTH_SERVICE_URL", self.auth.as_str()),
            ("NOTES_SERVICE_URL", self.notes.as_str()),
            ("WHITEBOARD_SERVICE_URL", self.whiteboards.as_str()),
            ("TASKS_SERVICE_URL", self.tasks.as_str()),
            ("PDF_TOOLS_SERVICE_URL", self.pdf_tools.as_str()),
        ]
    }
}

/// Startup validation failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("JWT_SECRET is not set")]
    MissingSecret,

    #[error("{var} is not a valid http(s) URL: {value}")]
    InvalidUpstreamUrl { var: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    ZeroLimit(&'static str),
}

const MIB: usize = 1024 * 1024;

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Some(v) = env::var("GATEWAY_PORT").ok().or_else(|| env::var("PORT").ok()) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("CORS_ORIGIN") {
            self.server.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Ok(v) = env::var("MAX_JSON_BODY_BYTES") {
            self.server.max_json_body_bytes = v.parse().unwrap_or(self.server.max_json_body_bytes);
        }
        if let Ok(v) = env::var("MAX_UPLOAD_BODY_BYTES") {
            self.server.max_upload_body_bytes = v.parse().unwrap_or(self.server.max_upload_body_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = Some(v).filter(|s| !s.is_empty());
        }
        if let Ok(v) = env::var("JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }

        // Upstream overrides
        if let Ok(v) = env::var("AUTH_SERVICE_URL") {
            self.upstreams.auth = v;
        }
        if let Ok(v) = env::var("NOTES_SERVICE_URL") {
            self.upstreams.notes = v;
        }
        if let Ok(v) = env::var("WHITEBOARD_SERVICE_URL") {
            self.upstreams.whiteboards = v;
        }
        if let Ok(v) = env::var("TASKS_SERVICE_URL") {
            self.upstreams.tasks = v;
        }
        if let Ok(v) = env::var("PDF_TOOLS_SERVICE_URL") {
            self.upstreams.pdf_tools = v;
        }
        if let Ok(v) = env::var("UPSTREAM_CONNECT_TIMEOUT_SECS") {
            self.upstreams.connect_timeout_secs = v.parse().unwrap_or(self.upstreams.connect_timeout_secs);
        }
        if let Ok(v) = env::var("UPSTREAM_TIMEOUT_SECS") {
            self.upstreams.request_timeout_secs = v.parse().unwrap_or(self.upstreams.request_timeout_secs);
        }

        self
    }

    /// Check everything the gateway needs before it accepts traffic.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.is_none() {
            return Err(ConfigError::MissingSecret);
        }

        for (var, value) in self.upstreams.named_urls() {
            let valid = Url::parse(value)
                .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
                .unwrap_or(false);
            if !valid {
                return Err(ConfigError::InvalidUpstreamUrl {
                    var,
                    value: value.to_string(),
                });
            }
        }

        if self.server.max_json_body_bytes == 0 {
            return Err(ConfigError::ZeroLimit("MAX_JSON_BODY_BYTES"));
        }
        if self.server.max_upload_body_bytes == 0 {
            return Err(ConfigError::ZeroLimit("MAX_UPLOAD_BODY_BYTES"));
        }

        Ok(())
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 3000,
                cors_origins: vec!["http://localhost:5173".to_string()],
                max_json_body_bytes: 20 * MIB,
                max_upload_body_bytes: 20 * MIB,
            },
            security: SecurityConfig {
                jwt_secret: None,
                jwt_expiry_hours: 8,
            },
            upstreams: UpstreamConfig {
                auth: "http://localhost:3001".to_string(),
                notes: "http://localhost:3004".to_string(),
                whiteboards: "http://localhost:3005".to_string(),
                tasks: "http://localhost:3007".to_string(),
                pdf_tools: "http://localhost:3002".to_string(),
                connect_timeout_secs: 10,
                request_timeout_secs: 60,
            },
        }
    }

    fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.server.cors_origins = vec!["https://staging.example.com".to_string()];
        config
    }

    fn production() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Production;
        config.server.cors_origins = vec!["https://app.example.com".to_string()];
        config.upstreams.connect_timeout_secs = 5;
        config.upstreams.request_timeout_secs = 30;
        config
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
