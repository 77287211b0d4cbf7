//! Demo x402 API server.
//!
//! # Usage
//!
//! ```bash
//! # Run with default config (config.toml in current directory)
//! cargo run -p tollway-server
//!
//! # Verify signatures in-process instead of calling a facilitator
//! cargo run -p tollway-server -- --config tollway-server/config.toml
//!
//! # Configure logging level
//! RUST_LOG=debug cargo run -p tollway-server
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` - Path to TOML configuration file (default: `config.toml`)
//! - `HOST` / `PORT` - Override bind address and port
//! - `PAY_TO` - Override the receiving address
//! - `FACILITATOR_URL` - Override the remote facilitator
//! - `RUST_LOG` - Log level filter (default: `info`)

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::Router;
use clap::Parser;
use tollway_evm::LocalVerifier;
use tollway_http::server::{FacilitatorClient, VerificationGate};
use tracing_subscriber::EnvFilter;

use tollway_server::config::{FacilitatorMode, ServerConfig};
use tollway_server::error::ServerError;
use tollway_server::routes::app;

/// Command-line flags. These take precedence over the file and environment.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Configuration file.
    #[arg(long, env = "CONFIG", default_value = "config.toml")]
    config: String,
    /// Bind address.
    #[arg(long)]
    host: Option<IpAddr>,
    /// Port.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run(Cli::parse()).await {
        tracing::error!("Server failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ServerConfig::load_from(&cli.config)?;
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    tracing::info!(
        host = %config.host,
        port = config.port,
        pay_to = %config.pay_to,
        network = %config.network,
        facilitator = ?config.facilitator,
        "Loaded configuration"
    );

    let app = build(&config)?;

    let addr = SocketAddr::new(config.host, config.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(ServerError::Io)?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Io)?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

fn build(config: &ServerConfig) -> Result<Router, ServerError> {
    match config.facilitator {
        FacilitatorMode::Remote => {
            let client = FacilitatorClient::try_from(config.facilitator_url.as_str())?;
            tracing::info!(url = %client.base_url(), "Verifying through remote facilitator");
            app(&with_base_url(VerificationGate::new(Arc::new(client)), config), config)
        }
        FacilitatorMode::Local => {
            tracing::warn!("Verifying signatures locally; payments are never settled");
            app(
                &with_base_url(VerificationGate::new(Arc::new(LocalVerifier::new())), config),
                config,
            )
        }
    }
}

fn with_base_url<F>(gate: VerificationGate<F>, config: &ServerConfig) -> VerificationGate<F> {
    match &config.base_url {
        Some(url) => gate.with_base_url(url.clone()),
        None => gate,
    }
}

/// Waits for Ctrl-C or SIGTERM (Unix) to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => tracing::info!("Received Ctrl-C, shutting down..."),
            _ = sigterm.recv() => tracing::info!("Received SIGTERM, shutting down..."),
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.expect("failed to listen for Ctrl-C");
        tracing::info!("Received Ctrl-C, shutting down...");
    }
}
