//! In-memory fee source
//!
//! Returns the same fixed outcome on every call. Used to drive the HTTP
//! layer without a ledger database.

use crate::ledger::{AggregatedFeePoint, DataSourceError, DataSourceResult, FeeSource};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Fee source with a fixed result
#[derive(Debug)]
pub struct StaticFeeSource {
    outcome: DataSourceResult<Vec<AggregatedFeePoint>>,
    calls: AtomicUsize,
}

impl StaticFeeSource {
    /// Always succeed with `points`
    pub fn new(points: Vec<AggregatedFeePoint>) -> Self {
        Self {
            outcome: Ok(points),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always succeed with no points
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Always fail with `error`
    pub fn failing(error: DataSourceError) -> Self {
        Self {
            outcome: Err(error),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of times the source has been queried
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeeSource for StaticFeeSource {
    async fn fetch_hourly_fees(&self) -> DataSourceResult<Vec<AggregatedFeePoint>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}
