//! KevaDB server daemon.
//!
//! # Usage
//!
//! ```bash
//! # Start with defaults (in-memory only, no durability)
//! kevad
//!
//! # Start with a configuration file
//! kevad --config /etc/keva/kevad.toml
//!
//! # Override the listen address
//! kevad --host 0.0.0.0 --port 3223
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use keva_server::{App, ServerConfig};

/// KevaDB server daemon
#[derive(Parser, Debug)]
#[command(
    name = "kevad",
    version,
    about = "KevaDB key-value server",
    long_about = "KevaDB is an in-memory key-value store with an optional write-ahead log\n\
                  and optional master/slave replication.\n\n\
                  This daemon starts the server and listens for client connections."
)]
struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE", env = "KEVA_CONFIG")]
    config: Option<PathBuf>,

    /// Host address to bind to (overrides the config file)
    #[arg(short = 'H', long, env = "KEVA_HOST")]
    host: Option<String>,

    /// Port to listen on (overrides the config file)
    #[arg(short = 'p', long, env = "KEVA_PORT")]
    port: Option<u16>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", env = "KEVA_LOG_LEVEL")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(args.log_level.clone())),
        )
        .init();

    let mut config = match &args.config {
        Some(path) => ServerConfig::from_file(path)?,
        None => ServerConfig::default(),
    };
    if let Some(host) = args.host {
        config.network.host = host;
    }
    if let Some(port) = args.port {
        config.network.port = port;
    }

    let app = App::bind(&config).await?;
    info!(addr = %app.client_addr()?, "kevad started");

    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
    let server = tokio::spawn(app.run(shutdown_rx));

    signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("received shutdown signal");

    let _ = shutdown_tx.send(()).await;
    server.await??;

    Ok(())
}
