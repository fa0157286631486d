use std::sync::Arc;

use anyhow::Context;

use crate::app::{app, AppState};
use crate::config::AppConfig;

pub async fn handle(config: &AppConfig, port: Option<u16>) -> anyhow::Result<()> {
    // Refuse to accept traffic with a config that would fail every request
    config.validate().context("configuration is invalid")?;

    tracing::info!("Starting suite gateway in {:?} mode", config.environment);
    for (var, url) in config.upstreams.named_urls() {
        tracing::info!(upstream = var, url, "upstream configured");
    }

    let state = Arc::new(AppState::from_config(config)?);
    let router = app(state, &config.server.cors_origins);

    let port = port.unwrap_or(config.server.port);
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("suite gateway listening on http://{}", bind_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("suite gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
