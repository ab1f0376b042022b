//! ProxyGrid API gateway.
//!
//! ```text
//!   client ──GET /api/proxygrid/...──▶ ┌──────────────────────────────────┐
//!                                      │ rate limit → validate → sanitize │
//!                                      │        → forward (30s) ──────────┼──▶ aggregation
//!   client ◀── shaped response ─────── │ ◀── shape + Cache-Control ◀──────┼─── backend
//!                                      └──────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use proxygrid_gateway::config::load_config;
use proxygrid_gateway::lifecycle::{spawn_signal_listener, Shutdown};
use proxygrid_gateway::observability::{logging, metrics};
use proxygrid_gateway::GatewayServer;

#[derive(Parser)]
#[command(name = "proxygrid-gateway")]
#[command(about = "API gateway for the ProxyGrid aggregation backend", long_about = None)]
struct Args {
    /// Path to a TOML configuration file. Defaults plus environment overrides
    /// are used when omitted.
    #[arg(short, long, env = "PROXYGRID_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    logging::init_logging(&config.observability)?;
    tracing::info!("proxygrid-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        route_prefix = %config.listener.route_prefix,
        upstream = %config.upstream.base_url,
        shared_secret = config.upstream.shared_secret.is_some(),
        rate_limit = config.rate_limit.requests,
        window_ms = config.rate_limit.window_ms,
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

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    spawn_signal_listener(shutdown);

    let server = GatewayServer::new(config)?;
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
