mod common;

use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Method, StatusCode};
use serde_json::json;

use common::{bearer, config_with_upstream, gateway, request, send, token_for, MockResponse, MockUpstream};

#[tokio::test]
async fn unknown_path_is_404_without_upstream_call() -> Result<()> {
    let upstream = MockUpstream::fixed(MockResponse::json(StatusCode::OK, json!({}))).await?;
    let router = gateway(&config_with_upstream(&upstream.url()));

    for path in ["/api/unknown", "/api", "/nope", "/api/notes/1/extra"] {
        let req = request(Method::GET, path)
            .header("authorization", bearer(&token_for(1_i64)))
            .body(Body::empty())?;
        let res = send(router.clone(), req).await?;

        assert_eq!(res.status, StatusCode::NOT_FOUND, "{}", path);
        assert_eq!(res.json(), json!({ "error": "not found" }));
    }
    assert_eq!(upstream.hits(), 0);
    Ok(())
}

#[tokio::test]
async fn unmapped_method_on_mapped_path_is_404() -> Result<()> {
    let upstream = MockUpstream::fixed(MockResponse::json(StatusCode::OK, json!({}))).await?;
    let router = gateway(&config_with_upstream(&upstream.url()));

    let cases = [
        (Method::DELETE, "/api/notes"),
        (Method::GET, "/api/auth/login"),
        (Method::POST, "/api/board"),
        (Method::GET, "/api/tasks/3/move"),
    ];

    for (method, path) in cases {
        let req = request(method.clone(), path)
            .header("authorization", bearer(&token_for(1_i64)))
            .body(Body::empty())?;
        let res = send(router.clone(), req).await?;

        assert_eq!(res.status, StatusCode::NOT_FOUND, "{} {}", method, path);
    }
    assert_eq!(upstream.hits(), 0);
    Ok(())
}

#[tokio::test]
async fn unknown_path_is_404_even_without_token() -> Result<()> {
    let upstream = MockUpstream::fixed(MockResponse::json(StatusCode::OK, json!({}))).await?;
    let router = gateway(&config_with_upstream(&upstream.url()));

    let res = send(router, request(Method::GET, "/api/secret-admin").body(Body::empty())?).await?;

    assert_eq!(res.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn trailing_slash_resolves_like_the_bare_path() -> Result<()> {
    let upstream = MockUpstream::fixed(MockResponse::json(StatusCode::OK, json!([]))).await?;
    let router = gateway(&config_with_upstream(&upstream.url()));

    let req = request(Method::GET, "/api/notes/")
        .header("authorization", bearer(&token_for(1_i64)))
        .body(Body::empty())?;
    let res = send(router, req).await?;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(upstream.hits(), 1);
    Ok(())
}

#[tokio::test]
async fn health_and_root_are_served_locally() -> Result<()> {
    let router = gateway(&config_with_upstream(&common::dead_upstream_url()));

    let health = send(router.clone(), request(Method::GET, "/health").body(Body::empty())?).await?;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.json()["status"], "ok");

    let root = send(router, request(Method::GET, "/").body(Body::empty())?).await?;
    assert_eq!(root.status, StatusCode::OK);
    let body = root.json();
    assert_eq!(body["name"], "suite-gateway");
    assert!(body["routes"].as_array().is_some_and(|r| r.len() == 16));
    Ok(())
}

#[tokio::test]
async fn dot_segments_are_404_without_upstream_call() -> Result<()> {
    let upstream = MockUpstream::fixed(MockResponse::json(StatusCode::OK, json!({}))).await?;
    let router = gateway(&config_with_upstream(&upstream.url()));

    for path in [
        "/api/notes/..",
        "/api/notes/.",
        "/api/notes/%2e%2e",
        "/api/notes/%2E%2e",
        "/api/pdf-tools/../notes",
        "/api/pdf-tools/%2e%2e/notes",
    ] {
        let req = request(Method::GET, path)
            .header("authorization", bearer(&token_for(1_i64)))
            .body(Body::empty())?;
        let res = send(router.clone(), req).await?;

        assert_eq!(res.status, StatusCode::NOT_FOUND, "{}", path);
        assert_eq!(res.json(), json!({ "error": "not found" }));
    }
    assert_eq!(upstream.hits(), 0);
    Ok(())
}

#[tokio::test]
async fn empty_segments_are_collapsed_before_forwarding() -> Result<()> {
    let upstream = MockUpstream::fixed(MockResponse::json(StatusCode::OK, json!([]))).await?;
    let router = gateway(&config_with_upstream(&upstream.url()));

    let req = request(Method::GET, "/api//notes//3?x=1")
        .header("authorization", bearer(&token_for(1_i64)))
        .body(Body::empty())?;
    let res = send(router, req).await?;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(upstream.last().path_and_query, "/notes/3?x=1");
    Ok(())
}

#[tokio::test]
async fn cors_preflight_allows_configured_origin() -> Result<()> {
    let router = gateway(&config_with_upstream(&common::dead_upstream_url()));

    let req = request(Method::OPTIONS, "/api/notes")
        .header(header::ORIGIN, "http://localhost:5173")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PUT")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization,content-type")
        .body(Body::empty())?;
    let res = send(router, req).await?;

    assert!(res.status.is_success());
    assert_eq!(
        res.headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:5173"
    );

    let methods = res.headers.get(header::ACCESS_CONTROL_ALLOW_METHODS).unwrap().to_str()?.to_string();
    for method in ["GET", "POST", "PUT", "DELETE"] {
        assert!(methods.contains(method), "{} missing from {}", method, methods);
    }

    let headers = res.headers.get(header::ACCESS_CONTROL_ALLOW_HEADERS).unwrap().to_str()?.to_ascii_lowercase();
    assert!(headers.contains("authorization"), "{}", headers);
    assert!(headers.contains("content-type"), "{}", headers);
    Ok(())
}

#[tokio::test]
async fn cors_ignores_unlisted_origin() -> Result<()> {
    let router = gateway(&config_with_upstream(&common::dead_upstream_url()));

    let req = request(Method::OPTIONS, "/api/notes")
        .header(header::ORIGIN, "http://evil.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .body(Body::empty())?;
    let res = send(router.clone(), req).await?;
    assert!(res.headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());

    let req = request(Method::GET, "/health")
        .header(header::ORIGIN, "http://localhost:5173")
        .body(Body::empty())?;
    let res = send(router, req).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(
        res.headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:5173"
    );
    Ok(())
}
