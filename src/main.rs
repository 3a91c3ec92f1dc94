//! Route registry server.
//!
//! Serves every request from the single active handler whose pattern is
//! the longest match for the request path. Handlers come from the config
//! file and the admin API and may be added or removed while serving.
//!
//! ```text
//!     Client Request         ┌──────────────────────────────────────────┐
//!     ───────────────────────┼─▶ http server ──▶ registry.resolve(path) │
//!                            │                        │                 │
//!     Client Response        │                        ▼                 │
//!     ◀──────────────────────┼── handler.respond ◀─ active handler      │
//!                            │                                          │
//!     config file ──watch──▶ │  sync_handlers ──▶ registry.add/remove   │
//!     admin API ───────────▶ │                                          │
//!                            └──────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use route_registry::config::{load_config, watcher::ConfigWatcher, ServerConfig};
use route_registry::lifecycle::{signals, Shutdown};
use route_registry::observability::{logging, metrics};
use route_registry::HttpServer;

#[derive(Parser)]
#[command(name = "route-registry")]
#[command(about = "Path routing server with prioritized handler registration", long_about = None)]
struct Args {
    /// TOML configuration file; watched for changes.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };

    logging::init(Some(&config.observability.log_level));
    tracing::info!("route-registry v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        handlers = config.handlers.len(),
        failover_order = ?config.registry.failover_order,
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

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    // Keep the watcher alive for the lifetime of the server.
    let (_watcher, config_updates) = match &args.config {
        Some(path) => {
            let (watcher, rx) = ConfigWatcher::new(path);
            (Some(watcher.run()?), rx)
        }
        None => {
            let (_tx, rx) = mpsc::unbounded_channel();
            (None, rx)
        }
    };

    let shutdown = Shutdown::new();
    signals::spawn_ctrl_c_handler(shutdown.clone());

    let server = HttpServer::new(config);
    server.run(listener, config_updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
