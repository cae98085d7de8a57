//! Prometheus configuration sidecar.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌─────────────────────────────────────────────┐
//!                    │                  SIDECAR                    │
//!   API request      │  ┌────────┐   ┌─────────────┐   ┌────────┐  │
//!   ─────────────────┼─▶│  http  │──▶│ coordinator │──▶│ merge  │  │
//!                    │  │ server │   │  / rules    │   │ engine │  │
//!                    │  └───┬────┘   └──────┬──────┘   └────────┘  │
//!                    │      │ other paths   │ fetch / reload       │
//!                    │      ▼               ▼                      │
//!                    │  ┌────────┐   ┌─────────────┐   ┌────────┐  │   ┌────────────┐
//!                    │  │ proxy  │   │ prometheus  │──▶│ writer │──┼──▶│ config and │
//!                    │  │        │   │   client    │   │        │  │   │ rule files │
//!                    │  └───┬────┘   └──────┬──────┘   └────────┘  │   └────────────┘
//!                    └──────┼───────────────┼──────────────────────┘
//!                           ▼               ▼
//!                          Prometheus HTTP API
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use prometheus_config_proxy::http::HttpServer;
use prometheus_config_proxy::lifecycle::{prepare_filesystem, wait_for_signal, Shutdown};
use prometheus_config_proxy::observability::{logging, metrics};
use prometheus_config_proxy::settings::{load_settings, Overrides};

#[derive(Parser)]
#[command(name = "prometheus-config-proxy", version)]
#[command(about = "Manage a Prometheus server's configuration and rule files over HTTP", long_about = None)]
struct Args {
    /// Sidecar settings file (TOML).
    #[arg(long, env = "SIDECAR_SETTINGS")]
    settings: Option<PathBuf>,

    #[command(flatten)]
    overrides: Overrides,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_settings(args.settings.as_deref(), &args.overrides)?;

    logging::init_tracing(&config.observability.log_level, config.observability.log_format);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "prometheus-config-proxy starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        prometheus = %config.prometheus.address,
        config_file = %config.prometheus.config_file.display(),
        rule_directory = %config.rules.directory.display(),
        "Configuration loaded"
    );

    prepare_filesystem(&config)?;

    let handle = if config.observability.metrics_enabled {
        Some(metrics::init_metrics()?)
    } else {
        None
    };

    let server = HttpServer::new(&config, handle)?;
    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.trigger();
    });

    server.run(listener, receiver).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
