//! route-dispatch server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ───────────────▶ http::server (request id, trace, timeout, body limit)
//!                          │
//!                          ▼
//!                      dispatch::Engine ── ArcSwap, rebuilt on config change
//!                          │
//!         ┌────────────────┼───────────────────────────┐
//!         ▼                ▼                           ▼
//!   before-interceptors  content modules         fallbacks
//!   (access log)         (status, users)         (assets, not-found)
//!                          │
//!                          ▼
//!                      routing (templates, priority, route tables)
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use route_dispatch::config::{load_config, ConfigWatcher, DispatchConfig};
use route_dispatch::demo::build_engine;
use route_dispatch::http::{EngineFactory, HttpServer};
use route_dispatch::lifecycle::{wait_for_signal, Shutdown};
use route_dispatch::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "route-dispatch")]
#[command(about = "HTTP route matching and dispatch server", long_about = None)]
struct Args {
    /// TOML configuration file; watched for changes when given.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => DispatchConfig::default(),
    };

    logging::init_tracing(&config.observability.log_level)?;
    tracing::info!("route-dispatch v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        context_path = %config.listener.context_path,
        absolute_typing = config.routing.absolute_typing,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let factory: EngineFactory = Arc::new(build_engine);
    let server = HttpServer::new(config.clone(), factory)?;

    // The watcher handle must outlive the server.
    let (_watcher, updates) = match &args.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        None => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let shutdown = Shutdown::new();
    let stop = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.trigger();
    });

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    server.run(listener, updates, stop).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
