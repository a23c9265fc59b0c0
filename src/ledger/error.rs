//! Data source error types
//!
//! Every failure of the fee aggregate maps to one of these. None of them
//! carry partial results.

use thiserror::Error;

/// Errors that can occur while aggregating fees from the ledger
#[derive(Error, Debug, Clone)]
pub enum DataSourceError {
    /// Ledger database could not be opened or configured
    #[error("Datasource unavailable: {0}")]
    Unavailable(String),

    /// Aggregation query was rejected by the store
    #[error("Query rejected: {0}")]
    Query(String),

    /// A result row did not have the expected shape
    #[error("Row decode failed: {0}")]
    Decode(String),

    /// Blocking aggregation task panicked or was cancelled
    #[error("Aggregation task failed: {0}")]
    Task(String),
}

impl DataSourceError {
    /// Classify a rusqlite error raised while running the query or reading rows
    pub(crate) fn from_query(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::InvalidColumnType(..)
            | rusqlite::Error::FromSqlConversionFailure(..)
            | rusqlite::Error::IntegralValueOutOfRange(..)
            | rusqlite::Error::InvalidColumnIndex(_) => DataSourceError::Decode(err.to_string()),
            other => DataSourceError::Query(other.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for DataSourceError {
    fn from(err: tokio::task::JoinError) -> Self {
        DataSourceError::Task(err.to_string())
    }
}

/// Result type alias for data source operations
pub type DataSourceResult<T> = Result<T, DataSourceError>;
