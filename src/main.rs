//! wscat-gateway server entry point.
//!
//! Starts the Axum HTTP server with REST and UI WebSocket endpoints, and
//! closes every outbound connection on shutdown.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use wscat_gateway::api;
use wscat_gateway::app_state::AppState;
use wscat_gateway::config::{GatewayConfig, LogFormat};
use wscat_gateway::domain::SessionRegistry;
use wscat_gateway::service::SessionService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = GatewayConfig::from_env()
        .map_err(|e| anyhow::anyhow!(e))
        .context("invalid configuration")?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    // wss:// handshakes need a process-wide crypto provider
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        tracing::debug!("rustls crypto provider already installed");
    }

    tracing::info!(
        addr = %config.listen_addr,
        default_server_url = %config.default_server_url,
        "starting wscat-gateway"
    );

    // Build domain + service layer
    let registry = Arc::new(SessionRegistry::new());
    let session_service = Arc::new(SessionService::new(registry, config.session_settings()));

    let app = api::build_app(AppState {
        session_service: Arc::clone(&session_service),
    });

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    session_service.shutdown().await;
    tracing::info!("shutdown complete");
    Ok(())
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
