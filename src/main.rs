//! ggcache - A minimal distributed in-memory cache
//!
//! Starts one cache node. Without `--leaderaddr` the node is the leader and
//! accepts joins; with it, the node joins that leader and mirrors its writes.

use anyhow::Context;
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ggcache::{Config, Server};

/// Command line flags. Each one overrides its environment variable.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Listen address of the server
    #[arg(long = "listenaddr")]
    listen_addr: Option<String>,

    /// Listen address of the leader to join
    #[arg(long = "leaderaddr")]
    leader_addr: Option<String>,
}

/// Main entry point for a cache node.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables and flags
/// 3. Bind the listening socket
/// 4. Serve until SIGINT/SIGTERM, then drain replication
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ggcache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(listen_addr) = cli.listen_addr {
        config.listen_addr = listen_addr;
    }
    if let Some(leader_addr) = cli.leader_addr.filter(|addr| !addr.is_empty()) {
        config.leader_addr = Some(leader_addr);
    }
    info!(
        listen_addr = %config.listen_addr,
        leader_addr = ?config.leader_addr,
        cleanup_interval_ms = config.cleanup_interval_ms,
        "configuration loaded"
    );

    let server = Server::bind(config.clone())
        .await
        .with_context(|| format!("failed to listen on {}", config.listen_addr))?;

    server.run_until(shutdown_signal()).await?;

    info!("server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::warn!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to install SIGTERM handler");
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
