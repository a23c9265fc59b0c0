//! # Feewatch
//!
//! A read-only HTTP API serving transaction fees from a ledger database,
//! aggregated per UTC hour.
//!
//! ## Modules
//!
//! - [`ledger`]: Fee aggregation over the ledger store
//! - [`api`]: REST API server with Axum
//! - [`config`]: TOML and environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use feewatch::{serve, AppState, Config, SqliteFeeSource};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env();
//!
//!     let fees = Arc::new(SqliteFeeSource::from_config(&config.datasource));
//!     serve(AppState::new(fees), &config.api).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod ledger;

// Re-export top-level types for convenience
pub use ledger::{
    AggregatedFeePoint, DataSourceError, DataSourceResult, FeeSource, SqliteFeeSource,
    StaticFeeSource,
};

pub use api::{build_router, serve, ApiError, ApiResult, AppState};

pub use config::{
    ApiConfig, Config, ConfigError, DataSourceConfig, LoadedConfig, LoggingConfig,
};
