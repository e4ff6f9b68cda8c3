// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Gateway HTTP server

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use pawa_core::domain::gateway_config::MetricsConfig;
use pawa_core::presentation::api::{app, AppState};

use crate::embedded::{load_config, EmbeddedGateway};

pub async fn serve(config_path: Option<PathBuf>, host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(host) = host {
        config.spec.server.bind_address = host;
    }
    if let Some(port) = port {
        config.spec.server.port = port;
    }

    info!("Configuration loaded: gateway={}", config.metadata.name);

    install_metrics_exporter(&config.spec.observability.metrics)?;

    let gateway = EmbeddedGateway::from_config(config)?;
    let server = &gateway.config.spec.server;
    let addr = format!("{}:{}", server.bind_address, server.port);

    info!(
        providers = ?gateway.registry.configured(),
        max_concurrent_requests = server.max_concurrent_requests,
        "Gateway services initialized"
    );

    let state = AppState::new(
        gateway.query_service.clone(),
        gateway.model_service.clone(),
        gateway.registry.clone(),
        server.max_concurrent_requests,
    );

    // Start HTTP server
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Gateway listening on {}", addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Gateway shutting down");

    Ok(())
}

/// Prometheus scrape endpoint on its own port
fn install_metrics_exporter(config: &MetricsConfig) -> Result<()> {
    if !config.enabled {
        return Ok(());
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("Failed to install Prometheus exporter")?;

    info!("Metrics exporter listening on {}", addr);
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
