//! Tiered failover reverse proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!                        │               FAILOVER PROXY                  │
//!                        │                                               │
//!   Client Request       │  ┌─────────┐    ┌──────────────────────┐     │
//!   ─────────────────────┼─▶│  http   │───▶│  forward (tier walk)  │────┼──── Tier 1 origin
//!                        │  │ server  │    │  skip Down, fall back │     │     Tier 2 origin
//!                        │  └─────────┘    └──────────┬───────────┘     │     Tier N origin
//!                        │                            │                  │
//!                        │                     reads  ▼  mark-down       │
//!                        │                  ┌──────────────────┐         │
//!                        │                  │   health store   │◀────────┼──── Prober
//!                        │                  │  (KV + TTL)      │         │     (interval)
//!                        │                  └──────────────────┘         │
//!                        │                                               │
//!                        │  ┌────────────────────────────────────────┐  │
//!                        │  │          Cross-Cutting Concerns         │  │
//!                        │  │  config │ report │ observability │ life │  │
//!                        │  └────────────────────────────────────────┘  │
//!                        └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use clap::Parser;
use tokio::net::TcpListener;

use failover_proxy::config;
use failover_proxy::http::HttpServer;
use failover_proxy::lifecycle::{shutdown, Shutdown};
use failover_proxy::observability::logging;

#[derive(Parser)]
#[command(name = "failover-proxy")]
#[command(about = "Tiered failover reverse proxy", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "failover.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let cli = Cli::parse();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "failover-proxy starting");

    let config = config::load_config(&cli.config)?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        origins = config.origins.len(),
        probe_interval_secs = config.probe.interval_secs,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(address = %local_addr, "Listening for connections");

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            failover_proxy::observability::metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let coordinator = Shutdown::new();
    let server_shutdown = coordinator.subscribe();
    let prober_shutdown = coordinator.subscribe();

    tokio::spawn(async move {
        shutdown::wait_for_ctrl_c(&coordinator).await;
    });

    let server = HttpServer::new(config)?;
    server.run(listener, server_shutdown, prober_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
