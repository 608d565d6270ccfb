//! Waypoint telemetry archive server binary.
//!
//! # Usage
//!
//! ```bash
//! waypoint-server --config ./config.json --log-level info
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use waypoint_server::{Config, Server};

/// Waypoint telemetry archive server.
#[derive(Parser, Debug)]
#[command(name = "waypoint-server")]
#[command(about = "Append-only telemetry archive server")]
#[command(version)]
struct Args {
    /// Path to the JSON config file. Created with defaults if absent.
    #[arg(long, default_value = "./config.json")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error). Overridden by `RUST_LOG`.
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(%err, "failed to load configuration");
            std::process::exit(1);
        },
    };

    tracing::info!(root = %config.root, bind = %config.bind_address(), "starting waypoint-server");

    let server = match Server::bind(&config).await {
        Ok(server) => server,
        Err(err) => {
            tracing::error!(%err, "failed to bind server");
            std::process::exit(1);
        },
    };

    tracing::info!(addr = %server.local_addr().unwrap_or_else(|_| ([0, 0, 0, 0], 0).into()), "listening");

    if let Err(err) = server.run().await {
        tracing::error!(%err, "accept loop terminated");
        std::process::exit(1);
    }
}
