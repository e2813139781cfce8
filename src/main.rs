//! Demo server for the monitoring integration.
//!
//! Reads configuration from an optional TOML file plus `SENTRY_*`
//! environment variables, initializes logging and the monitoring client,
//! and serves a page carrying the browser snippet.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use sentryx::config::{load_config, load_from_env};
use sentryx::http::HttpServer;
use sentryx::observability::init_logging;

#[derive(Debug, Parser)]
#[command(name = "sentryx-demo", version, about = "Monitoring integration demo server")]
struct Args {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address, overrides the config file.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => load_from_env()?,
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    init_logging(&config.observability)?;
    tracing::info!("sentryx-demo v{} starting", env!("CARGO_PKG_VERSION"));

    // Held until exit so pending events are flushed.
    let _guard = sentryx::init(&config.sentry)?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        monitoring = config.sentry.is_enabled(),
        database = config.database.is_some(),
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config)?;
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
