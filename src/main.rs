//! Service gateway
//!
//! Single entry point in front of the user, item and list services.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌────────────────────────────────────────────────┐
//!                         │                    GATEWAY                     │
//!     Client Request      │  ┌─────────┐   ┌───────────┐   ┌────────────┐  │
//!     ────────────────────┼─▶│  http   │──▶│  routing  │──▶│   proxy    │──┼──▶ user-service
//!                         │  │ server  │   │ longest   │   │ forwarder  │──┼──▶ item-service
//!                         │  └────┬────┘   │  prefix   │   └─────┬──────┘──┼──▶ list-service
//!                         │       │        └───────────┘         │         │
//!                         │       ▼                              ▼         │
//!                         │  ┌───────────┐  ┌──────────┐  ┌────────────┐   │
//!                         │  │ aggregate │  │ registry │◀─│ resilience │   │
//!                         │  │ dashboard │  │  + admin │  │  circuit   │   │
//!                         │  │  search   │  └────▲─────┘  │  breaker   │   │
//!                         │  └───────────┘       │        └────────────┘   │
//!                         │                 ┌────┴────┐                    │
//!                         │                 │ health  │ periodic checks    │
//!                         │                 │ monitor │                    │
//!                         │                 └─────────┘                    │
//!                         │  config · auth · observability · security      │
//!                         └────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use service_gateway::config::{load_config, watcher::ConfigWatcher, GatewayConfig};
use service_gateway::lifecycle::{wait_for_signal, Shutdown};
use service_gateway::observability::{logging, metrics};
use service_gateway::HttpServer;

#[derive(Parser)]
#[command(name = "service-gateway")]
#[command(about = "API gateway with service registry and circuit breaking", long_about = None)]
struct Args {
    /// Path to a TOML config file. Built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reload routes and services when the config file changes.
    #[arg(short, long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => {
            let mut config = GatewayConfig::default();
            service_gateway::config::loader::apply_env_overrides(&mut config);
            config
        }
    };

    logging::init_tracing(&config.observability);
    tracing::info!("service-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    if config.auth.jwt_secret.is_empty() {
        tracing::warn!("No JWT secret configured; aggregation endpoints will reject every token");
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        routes = config.routes.len(),
        services = config.services.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // The watcher handle must outlive the server.
    let (_watcher, config_updates) = match (&args.config, args.watch) {
        (Some(path), true) => {
            let (watcher, rx) = ConfigWatcher::new(path);
            (Some(watcher.run()?), rx)
        }
        _ => {
            let (_tx, rx) = mpsc::unbounded_channel();
            (None, rx)
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config);
    let server_task = tokio::spawn(server.run(listener, config_updates, shutdown.subscribe()));

    wait_for_signal().await;
    tracing::info!("Starting graceful shutdown");
    shutdown.trigger();

    server_task.await??;
    tracing::info!("Shutdown complete");
    Ok(())
}
