//! gangway controller entry point.
//!
//! Initialises tracing, loads `GANGWAY_*` configuration, connects to the
//! Proxmox VE API when one is configured, and serves the HTTP control
//! plane.

mod config;
mod ops_log;
mod proxmox;
mod routes;
mod ssh;
mod state;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::ops_log::OperationLog;
use crate::proxmox::ProxmoxClient;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialise tracing with RUST_LOG env filter.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "gangway starting");

    // 2. Load configuration from GANGWAY_* env vars.
    let config = Config::from_env()?;
    tracing::info!(
        listen_addr = %config.listen_addr,
        proxmox_host = config.proxmox_host.as_deref().unwrap_or("<disabled>"),
        ssh_host = config.ssh_host.as_deref().unwrap_or("<unset>"),
        "configuration loaded",
    );

    // 3. Connect to the Proxmox API (ticket login happens here when
    //    password auth is configured).
    let proxmox = ProxmoxClient::connect(&config).await?;
    if proxmox.is_none() {
        tracing::warn!("no GANGWAY_PROXMOX_HOST set; Proxmox routes will answer 503");
    }

    // 4. Assemble shared state and the router.
    let state = Arc::new(AppState {
        proxmox,
        allow_list: config.allow_list(),
        ssh_defaults: config.connection_defaults(),
        ops_log: OperationLog::new(config.ops_log_capacity),
        lxc_password_min_length: config.lxc_password_min_length,
    });
    let router = routes::router(state);

    // 5. Bind and serve until SIGINT.
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!("gangway ready — http://{}", config.listen_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    tracing::info!("gangway shut down");
    Ok(())
}

/// Wait for SIGINT (Ctrl-C) for graceful shutdown.
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to install Ctrl-C handler");
    }
}
