//! Core data types for the ledger fee aggregate
//!
//! - `AggregatedFeePoint`: total fee paid in one UTC hour
//! - `SECONDS_PER_HOUR` / `WEI_TO_ETHER`: grouping width and unit scale,
//!   bound into the aggregation query

use serde::{Deserialize, Serialize};

/// Seconds in one hour bucket
pub const SECONDS_PER_HOUR: i64 = 3600;

/// Scale factor from the smallest currency denomination (wei) to the major unit
pub const WEI_TO_ETHER: f64 = 1e-18;

/// Total transaction fee paid during one UTC hour
///
/// Serialized with short keys: `{"t": <hour epoch seconds>, "v": <fee>}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AggregatedFeePoint {
    /// Start of the hour, seconds since epoch
    #[serde(rename = "t")]
    pub timestamp: i64,
    /// Fee paid in that hour, in the ledger's major unit
    #[serde(rename = "v")]
    pub fee: f64,
}

impl AggregatedFeePoint {
    pub fn new(timestamp: i64, fee: f64) -> Self {
        Self { timestamp, fee }
    }
}
