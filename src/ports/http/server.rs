// src/ports/http/server.rs
use crate::config::ServerConfig;
use crate::ports::http::{router, AppState};
use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{error, info};

/// Bind the configured address and serve until Ctrl-C.
pub async fn serve(config: &ServerConfig, state: AppState) -> Result<()> {
    let listener = TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.host, config.port))?;

    let addr = listener.local_addr().context("Failed to read bound address")?;
    info!("Starting bookmark server on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server terminated with an error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        // Without a signal handler, run until the process is killed.
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
