//! Reverse dispatcher: forwards a routed request to its upstream and relays the answer.
//!
//! One attempt per request. Any upstream status, including 4xx/5xx, is relayed as the
//! upstream sent it; only a failure to get a response at all becomes a gateway error.

pub mod headers;

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::Response,
};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use thiserror::Error;

use crate::config::{ServerConfig, UpstreamConfig};
use crate::middleware::{attach_identity, strip_identity, AuthUser};
use crate::routes::{ForwardStyle, ResolvedRoute};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("{service} unreachable: {reason}")]
    Unreachable { service: String, reason: String },

    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("request body is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("failed to read request body: {0}")]
    ReadBody(String),

    #[error("verified subject cannot be sent as an identity header")]
    InvalidIdentity,
}

/// Shared upstream client plus body limits.
///
/// The client carries no default headers; identity is set per call.
#[derive(Clone)]
pub struct Dispatcher {
    client: reqwest::Client,
    max_json_body: usize,
    max_upload_body: usize,
}

impl Dispatcher {
    pub fn new(upstreams: &UpstreamConfig, server: &ServerConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(upstreams.connect_timeout())
            .timeout(upstreams.request_timeout())
            // Redirects belong to the browser, not the gateway
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            max_json_body: server.max_json_body_bytes,
            max_upload_body: server.max_upload_body_bytes,
        })
    }

    pub async fn forward(
        &self,
        route: &ResolvedRoute<'_>,
        request: Request,
        user: Option<&AuthUser>,
    ) -> Result<Response, DispatchError> {
        let style = route.entry.style;
        let (parts, body) = request.into_parts();

        let mut outbound_headers = match style {
            ForwardStyle::Json => HeaderMap::new(),
            ForwardStyle::Stream => headers::forwardable_request_headers(&parts.headers),
        };

        // Identity is settled before the body is read or the upstream is contacted
        match user {
            Some(user) => attach_identity(user, &mut outbound_headers).map_err(|_| DispatchError::InvalidIdentity)?,
            None => strip_identity(&mut outbound_headers),
        }

        let limit = match style {
            ForwardStyle::Json => self.max_json_body,
            ForwardStyle::Stream => self.max_upload_body,
        };
        let body = read_body(body, &parts.headers, limit).await?;

        let outbound_body = match style {
            ForwardStyle::Json => {
                let encoded = json_body(body)?;
                if !encoded.is_empty() {
                    outbound_headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
                }
                encoded
            }
            ForwardStyle::Stream => body,
        };

        let url = route.upstream_url(parts.uri.query());
        let service = route.service();

        let mut builder = self
            .client
            .request(parts.method.clone(), &url)
            .headers(outbound_headers);
        if !outbound_body.is_empty() {
            builder = builder.body(outbound_body);
        }

        let upstream = builder.send().await.map_err(|e| {
            tracing::error!(service, method = %parts.method, url = %url, error = %e, "upstream unreachable");
            DispatchError::Unreachable {
                service: service.to_string(),
                reason: e.to_string(),
            }
        })?;

        tracing::debug!(
            service,
            method = %parts.method,
            url = %url,
            status = upstream.status().as_u16(),
            "upstream responded"
        );

        match style {
            ForwardStyle::Json => relay_json(service, upstream).await,
            ForwardStyle::Stream => Ok(relay_stream(upstream)),
        }
    }
}

/// Read the inbound body, refusing anything over `limit` before the upstream is contacted
async fn read_body(body: Body, headers: &HeaderMap, limit: usize) -> Result<Bytes, DispatchError> {
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    if declared.is_some_and(|len| len > limit as u64) {
        tracing::warn!(limit, declared, "request body rejected by declared length");
        return Err(DispatchError::PayloadTooLarge { limit });
    }

    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.is::<LengthLimitError>() => {
            tracing::warn!(limit, "request body exceeded limit while reading");
            Err(DispatchError::PayloadTooLarge { limit })
        }
        Err(e) => Err(DispatchError::ReadBody(e.to_string())),
    }
}

/// Parse and re-serialize a JSON CRUD body
fn json_body(body: Bytes) -> Result<Bytes, DispatchError> {
    if body.is_empty() {
        return Ok(body);
    }

    let value: serde_json::Value =
        serde_json::from_slice(&body).map_err(|e| DispatchError::InvalidJson(e.to_string()))?;
    let encoded = serde_json::to_vec(&value).map_err(|e| DispatchError::InvalidJson(e.to_string()))?;

    Ok(Bytes::from(encoded))
}

/// Copy status and body; 204 and empty bodies become a bodiless response
async fn relay_json(service: &str, upstream: reqwest::Response) -> Result<Response, DispatchError> {
    let status = upstream.status();
    let content_type = upstream.headers().get(header::CONTENT_TYPE).cloned();

    if status == StatusCode::NO_CONTENT {
        return Ok(empty_response(status));
    }

    let bytes = upstream.bytes().await.map_err(|e| {
        tracing::error!(service, error = %e, "upstream response body failed");
        DispatchError::Unreachable {
            service: service.to_string(),
            reason: e.to_string(),
        }
    })?;

    if bytes.is_empty() {
        return Ok(empty_response(status));
    }

    if !status.is_success() {
        tracing::debug!(service, status = status.as_u16(), "relaying upstream error response");
    }

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        content_type.unwrap_or_else(|| HeaderValue::from_static("application/json")),
    );
    Ok(response)
}

/// Relay status, headers and the body stream untouched
fn relay_stream(upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let headers = headers::relayable_response_headers(upstream.headers());

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

fn empty_response(status: StatusCode) -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response
}
