#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use chrono::Duration;
use http_body_util::BodyExt;
use tower::ServiceExt;

use suite_gateway::auth::{issue_token, Claims, SubjectId};
use suite_gateway::config::AppConfig;
use suite_gateway::{app, AppState};

pub const SECRET: &str = "integration-test-secret";

/// One request as the mock upstream received it
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path_and_query: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Canned upstream reply
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: StatusCode,
    pub headers: Vec<(&'static str, &'static str)>,
    pub body: Vec<u8>,
}

impl MockResponse {
    pub fn json(status: StatusCode, body: serde_json::Value) -> Self {
        Self {
            status,
            headers: vec![("content-type", "application/json; charset=utf-8")],
            body: serde_json::to_vec(&body).unwrap(),
        }
    }

    pub fn raw(status: StatusCode, content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: vec![("content-type", content_type)],
            body: body.into(),
        }
    }

    pub fn empty(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: &'static str, value: &'static str) -> Self {
        self.headers.push((name, value));
        self
    }
}

impl IntoResponse for MockResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        for (name, value) in self.headers {
            response.headers_mut().insert(name, HeaderValue::from_static(value));
        }
        response
    }
}

type Responder = Arc<dyn Fn(&RecordedRequest) -> MockResponse + Send + Sync>;

struct MockState {
    responder: Responder,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// Real HTTP upstream on an ephemeral port that records what it receives
pub struct MockUpstream {
    pub addr: SocketAddr,
    state: Arc<MockState>,
}

impl MockUpstream {
    pub async fn start<F>(responder: F) -> Result<Self>
    where
        F: Fn(&RecordedRequest) -> MockResponse + Send + Sync + 'static,
    {
        let state = Arc::new(MockState {
            responder: Arc::new(responder),
            requests: Mutex::new(Vec::new()),
        });

        let router = Router::new().fallback(record).with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .context("failed to bind mock upstream")?;
        let addr = listener.local_addr()?;

        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Ok(Self { addr, state })
    }

    /// Upstream that always answers with the same response
    pub async fn fixed(response: MockResponse) -> Result<Self> {
        Self::start(move |_| response.clone()).await
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn hits(&self) -> usize {
        self.state.requests.lock().unwrap().len()
    }

    pub fn last(&self) -> RecordedRequest {
        self.requests().pop().expect("mock upstream received no request")
    }
}

async fn record(State(state): State<Arc<MockState>>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let body = body.collect().await.map(|c| c.to_bytes()).unwrap_or_default();

    let recorded = RecordedRequest {
        method: parts.method,
        path_and_query: parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_default(),
        headers: parts.headers,
        body,
    };

    let reply = (state.responder)(&recorded);
    state.requests.lock().unwrap().push(recorded);
    reply.into_response()
}

/// Upstream that accepts connections and never answers.
///
/// Accepted sockets are held open until the test's runtime shuts down.
pub async fn silent_upstream() -> Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .context("failed to bind silent upstream")?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    Ok(format!("http://{}", addr))
}

/// Port with nothing listening on it
pub fn dead_upstream_url() -> String {
    let port = portpicker::pick_unused_port().expect("no free port");
    format!("http://127.0.0.1:{}", port)
}

/// Development config with the test secret and every upstream pointed at `url`
pub fn config_with_upstream(url: &str) -> AppConfig {
    let mut config = AppConfig::development();
    config.security.jwt_secret = Some(SECRET.to_string());
    config.upstreams.auth = url.to_string();
    config.upstreams.notes = url.to_string();
    config.upstreams.whiteboards = url.to_string();
    config.upstreams.tasks = url.to_string();
    config.upstreams.pdf_tools = url.to_string();
    config.upstreams.connect_timeout_secs = 2;
    config.upstreams.request_timeout_secs = 5;
    config
}

pub fn gateway(config: &AppConfig) -> Router {
    let state = AppState::from_config(config).expect("gateway state");
    app(Arc::new(state), &config.server.cors_origins)
}

pub fn token_for(subject: impl Into<SubjectId>) -> String {
    let claims = Claims::new(subject.into(), Some("user@example.com".to_string()), Duration::hours(8));
    issue_token(SECRET, &claims).unwrap()
}

/// Token over arbitrary claims, for shapes `Claims` cannot produce
pub fn token_from_json(claims: serde_json::Value) -> String {
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

pub fn expired_token_for(subject: impl Into<SubjectId>) -> String {
    let claims = Claims::new(subject.into(), Some("user@example.com".to_string()), Duration::hours(-1));
    issue_token(SECRET, &claims).unwrap()
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// Gateway response with the body fully read
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body)
            .unwrap_or_else(|e| panic!("body is not JSON ({}): {:?}", e, self.body))
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }
}

pub async fn send(router: Router, request: axum::http::Request<Body>) -> Result<TestResponse> {
    let response = router.oneshot(request).await?;
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await?.to_bytes();
    Ok(TestResponse { status, headers, body })
}

pub fn request(method: Method, uri: &str) -> axum::http::request::Builder {
    axum::http::Request::builder().method(method).uri(uri)
}
