//! Feewatch API Server
//!
//! Run with: cargo run --bin feewatch-api
//!
//! # Configuration
//!
//! Environment variables:
//! - `ETH_DB_PATH`: Ledger database path
//! - `ETH_DB_BUSY_TIMEOUT_MS`: Wait on a locked ledger (default: 5000)
//! - `FEEWATCH_API_HOST`: Host to bind to (default: 0.0.0.0)
//! - `FEEWATCH_API_PORT`: Port to listen on (default: 8081)
//! - `FEEWATCH_LOG_LEVEL`: Log level (default: info)
//! - `FEEWATCH_LOG_FORMAT`: `pretty` or `json` (default: pretty)
//! - `RUST_LOG`: Full filter directive, takes precedence over the log level

use anyhow::Context;
use clap::Parser;
use feewatch::api::{serve, AppState};
use feewatch::config::{generate_default_config, Config, LoadedConfig, LoggingConfig};
use feewatch::ledger::SqliteFeeSource;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "feewatch-api")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Serve hourly transaction fees from a ledger database")]
struct Args {
    /// Config file (default: search standard locations)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Print a default config file and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.print_config {
        print!("{}", generate_default_config());
        return Ok(());
    }

    let loaded = match &args.config {
        Some(path) => LoadedConfig {
            config: Config::load_with_env(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            source: Some(path.clone()),
            skipped: Vec::new(),
        },
        None => Config::load_default(),
    };
    let mut config = loaded.config.clone();

    if let Some(host) = args.host {
        config.api.host = host;
    }
    if let Some(port) = args.port {
        config.api.port = port;
    }

    init_tracing(&config.logging);

    tracing::info!("Starting Feewatch API server v{}", env!("CARGO_PKG_VERSION"));
    loaded.log_origin();

    let fees = SqliteFeeSource::from_config(&config.datasource);
    tracing::info!("Ledger database: {:?}", fees.path());

    // The server still starts; each request reports its own failure
    match fees.health_check().await {
        Ok(()) => tracing::info!("Ledger connection verified"),
        Err(e) => tracing::warn!("Ledger not available: {}", e),
    }

    let state = AppState::new(Arc::new(fees));

    tracing::info!("Starting server on {}", config.api.addr());
    serve(state, &config.api)
        .await
        .context("API server failed")?;

    tracing::info!("Feewatch API server stopped");
    Ok(())
}

/// Initialize tracing from the logging config, `RUST_LOG` wins when set
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("feewatch={},tower_http=debug", logging.level))
    });

    let registry = tracing_subscriber::registry().with(filter);

    if logging.is_json() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
