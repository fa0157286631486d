// routes/mod.rs - Static route table mapping (method, path) to an upstream service
//
// Built once at startup and shared read-only between requests.

pub mod pattern;
pub mod suite;

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use axum::http::Method;
use serde::Serialize;
use thiserror::Error;

pub use pattern::PathPattern;
use pattern::{normalize_path, split_path};

/// Resolution failure for a single request
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("no route for {method} {path}")]
    NoRoute { method: String, path: String },
}

/// Table construction failure
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouteTableError {
    #[error("invalid route pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: &'static str },

    #[error("routes '{first}' and '{second}' are ambiguous for {methods}")]
    Ambiguous {
        first: String,
        second: String,
        methods: String,
    },
}

/// Upstream service a route forwards to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Upstream {
    /// Name used in logs and in 502 envelopes, e.g. `notes-service`
    pub name: String,
    pub base_url: String,
}

impl Upstream {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodFilter {
    Any,
    Only(Vec<Method>),
}

impl MethodFilter {
    pub fn allows(&self, method: &Method) -> bool {
        match self {
            MethodFilter::Any => true,
            MethodFilter::Only(methods) => methods.contains(method),
        }
    }

    fn overlaps(&self, other: &MethodFilter) -> bool {
        match (self, other) {
            (MethodFilter::Any, _) | (_, MethodFilter::Any) => true,
            (MethodFilter::Only(a), MethodFilter::Only(b)) => a.iter().any(|m| b.contains(m)),
        }
    }
}

impl fmt::Display for MethodFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodFilter::Any => f.write_str("*"),
            MethodFilter::Only(methods) => {
                let names: Vec<&str> = methods.iter().map(Method::as_str).collect();
                f.write_str(&names.join(","))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    Public,
    Protected,
}

/// How the dispatcher handles bodies for a route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ForwardStyle {
    /// Parse and re-serialize JSON request bodies
    Json,
    /// Pass bytes and headers through untouched
    Stream,
}

#[derive(Debug, Clone)]
pub struct RouteEntry {
    pub methods: MethodFilter,
    pub pattern: PathPattern,
    pub upstream: Arc<Upstream>,
    pub strip_prefix: Option<String>,
    pub access: Access,
    pub style: ForwardStyle,
}

impl RouteEntry {
    /// Protected JSON route with no prefix strip
    pub fn new(methods: MethodFilter, pattern: &str, upstream: Arc<Upstream>) -> Result<Self, RouteTableError> {
        Ok(Self {
            methods,
            pattern: PathPattern::parse(pattern)?,
            upstream,
            strip_prefix: None,
            access: Access::Protected,
            style: ForwardStyle::Json,
        })
    }

    pub fn strip_prefix(mut self, prefix: &str) -> Self {
        self.strip_prefix = Some(prefix.trim_end_matches('/').to_string());
        self
    }

    pub fn public(mut self) -> Self {
        self.access = Access::Public;
        self
    }

    pub fn stream(mut self) -> Self {
        self.style = ForwardStyle::Stream;
        self
    }

    /// Path as the upstream sees it
    fn upstream_path(&self, path: &str) -> String {
        let stripped = match &self.strip_prefix {
            Some(prefix) => strip_segments(path, prefix),
            None => path,
        };

        if stripped.is_empty() {
            "/".to_string()
        } else if stripped.starts_with('/') {
            stripped.to_string()
        } else {
            format!("/{}", stripped)
        }
    }
}

/// Remove `prefix` only when it ends on a segment boundary
fn strip_segments<'a>(path: &'a str, prefix: &str) -> &'a str {
    match path.strip_prefix(prefix) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => path,
    }
}

/// A route entry matched against one request path
#[derive(Debug, Clone)]
pub struct ResolvedRoute<'a> {
    pub entry: &'a RouteEntry,
    pub upstream_path: String,
}

impl ResolvedRoute<'_> {
    pub fn service(&self) -> &str {
        &self.entry.upstream.name
    }

    pub fn upstream_url(&self, query: Option<&str>) -> String {
        match query.filter(|q| !q.is_empty()) {
            Some(q) => format!("{}{}?{}", self.entry.upstream.base_url, self.upstream_path, q),
            None => format!("{}{}", self.entry.upstream.base_url, self.upstream_path),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    /// Build a table, rejecting entries that could tie for the same request.
    pub fn new(entries: Vec<RouteEntry>) -> Result<Self, RouteTableError> {
        for (i, a) in entries.iter().enumerate() {
            for b in &entries[i + 1..] {
                let tie = a.methods.overlaps(&b.methods)
                    && a.pattern.overlaps(&b.pattern)
                    && a.pattern.specificity(&b.pattern) == Ordering::Equal;
                if tie {
                    return Err(RouteTableError::Ambiguous {
                        first: a.pattern.to_string(),
                        second: b.pattern.to_string(),
                        methods: format!("{} / {}", a.methods, b.methods),
                    });
                }
            }
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    /// Most specific entry matching the request.
    ///
    /// Matching and the upstream path both use the normalized path, so what the
    /// upstream receives is exactly what the chosen entry matched.
    pub fn resolve(&self, method: &Method, path: &str) -> Result<ResolvedRoute<'_>, RouteError> {
        let no_route = || RouteError::NoRoute {
            method: method.to_string(),
            path: path.to_string(),
        };

        let normalized = normalize_path(path).ok_or_else(|| {
            tracing::warn!(%method, path, "dot segment in request path");
            no_route()
        })?;

        let entry = self
            .entries
            .iter()
            .filter(|e| e.methods.allows(method) && e.pattern.matches(&normalized))
            .max_by(|a, b| a.pattern.specificity(&b.pattern))
            .ok_or_else(no_route)?;

        Ok(ResolvedRoute {
            entry,
            upstream_path: entry.upstream_path(&normalized),
        })
    }

    /// Whether any entry's pattern matches, ignoring the method
    pub fn knows_path(&self, path: &str) -> bool {
        split_path(path).next().is_some()
            && normalize_path(path).is_some_and(|p| self.entries.iter().any(|e| e.pattern.matches(&p)))
    }
}
