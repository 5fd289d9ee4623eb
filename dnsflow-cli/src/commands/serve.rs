//! Daemon mode.

use anyhow::Result;
use dnsflow_app::AppState;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

pub async fn run(state: &AppState) -> Result<()> {
    state.start_scheduler().await?;
    tracing::info!("Scheduler running, waiting for shutdown signal");

    let received = wait_for_shutdown().await;
    tracing::info!("Received {received}, shutting down");
    state.shutdown().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown() -> &'static str {
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!("Failed to install SIGTERM handler: {e}");
            return wait_for_ctrl_c().await;
        }
    };
    tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        name = wait_for_ctrl_c() => name,
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown() -> &'static str {
    wait_for_ctrl_c().await
}

async fn wait_for_ctrl_c() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for SIGINT: {e}");
        std::future::pending::<()>().await;
    }
    "SIGINT"
}
