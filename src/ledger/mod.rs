//! Ledger Fee Aggregation
//!
//! Data source side of the fee pipeline:
//!
//! - **types**: `AggregatedFeePoint` and the aggregation constants
//! - **error**: `DataSourceError`
//! - **sqlite**: `SqliteFeeSource`, the production aggregator
//! - **memory**: `StaticFeeSource`, a fixed in-memory stand-in
//!
//! # Example
//!
//! ```rust,no_run
//! use feewatch::ledger::{FeeSource, SqliteFeeSource};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = SqliteFeeSource::new("./ledger.db", Duration::from_secs(5));
//!
//!     for point in source.fetch_hourly_fees().await? {
//!         println!("{} -> {}", point.timestamp, point.fee);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod memory;
pub mod sqlite;
pub mod types;

pub use error::{DataSourceError, DataSourceResult};
pub use memory::StaticFeeSource;
pub use sqlite::{SqliteFeeSource, LEDGER_SCHEMA, ZERO_ADDRESS};
pub use types::{AggregatedFeePoint, SECONDS_PER_HOUR, WEI_TO_ETHER};

use async_trait::async_trait;

/// Anything that can produce the hourly fee aggregate
///
/// Implementations must be safe to call from many requests at once.
#[async_trait]
pub trait FeeSource: Send + Sync {
    /// Fetch total fees per UTC hour
    ///
    /// Returns every non-empty hour, or an error with no partial results.
    /// The order of the returned points is unspecified.
    async fn fetch_hourly_fees(&self) -> DataSourceResult<Vec<AggregatedFeePoint>>;
}
