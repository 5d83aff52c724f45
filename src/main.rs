//! Caching Proxy - A forwarding HTTP proxy with a shared response cache
//!
//! # Startup Sequence
//! 1. Initialize tracing subscriber for logging
//! 2. Load configuration from environment variables and command line
//! 3. Create the shared cache
//! 4. Start the background stats reporter
//! 5. Start the admin API if an admin port is configured
//! 6. Accept proxy connections until SIGINT/SIGTERM

use std::net::SocketAddr;

use anyhow::{anyhow, Context};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use caching_proxy::{create_router, proxy, spawn_stats_task, AdminState, Config, Listener, ProxyState};

#[derive(Parser)]
#[command(name = "caching_proxy")]
#[command(about = "Forwarding HTTP proxy with a shared response cache", long_about = None)]
struct Cli {
    /// Port to listen on (overrides PROXY_PORT)
    port: Option<u16>,

    /// Serve the admin API on this port (overrides ADMIN_PORT)
    #[arg(long)]
    admin_port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "caching_proxy=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(port) = cli.port {
        config.port = port;
    }
    if cli.admin_port.is_some() {
        config.admin_port = cli.admin_port;
    }
    config.validate().map_err(|e| anyhow!(e))?;
    info!(
        "Configuration loaded: port={}, max_cache_size={}, max_object_size={}, max_headers_size={}, max_connections={}",
        config.port,
        config.max_cache_size,
        config.max_object_size,
        config.max_headers_size,
        config.max_connections
    );

    let state = ProxyState::from_config(&config);
    info!("Cache initialized");

    let stats_handle = (config.stats_interval > 0)
        .then(|| spawn_stats_task(state.cache.clone(), config.stats_interval));

    let admin_handle = match config.admin_port {
        Some(port) => {
            let addr = SocketAddr::from(([0, 0, 0, 0], port));
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("failed to bind admin API on {}", addr))?;
            info!("Admin API listening on http://{}", addr);
            let app = create_router(AdminState::new(state.cache.clone()));
            Some(tokio::spawn(async move {
                if let Err(e) = axum::serve(listener, app).await {
                    error!(error = %e, "Admin API stopped");
                }
            }))
        }
        None => None,
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = Listener::bind(addr, config.max_connections)
        .await
        .with_context(|| format!("failed to listen on port {}", config.port))?;
    info!("Proxy listening on {}", addr);

    proxy::serve(listener, state, shutdown_signal()).await?;

    if let Some(handle) = stats_handle {
        handle.abort();
    }
    if let Some(handle) = admin_handle {
        handle.abort();
    }
    warn!("Background tasks aborted");
    info!("Proxy shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
