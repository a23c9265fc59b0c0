//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use crate::ledger::FeeSource;
use std::sync::Arc;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Aggregator producing the hourly fee series
    pub fees: Arc<dyn FeeSource>,
}

impl AppState {
    /// Create a new AppState around a fee source
    pub fn new(fees: Arc<dyn FeeSource>) -> Self {
        Self { fees }
    }
}
