//! API Error Types
//!
//! Defines error types for the API layer and implements conversion
//! to HTTP responses with appropriate status codes.
//!
//! Response bodies are fixed plain-text messages. Failure details go to the
//! log only.

use axum::{
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::ledger::DataSourceError;

/// Body for any method other than GET
pub const INVALID_METHOD_MESSAGE: &str = "Invalid HTTP Method, only HTTP GET is allowed";

/// Body for a failed fee aggregation
pub const DATASOURCE_MESSAGE: &str = "Error communicating with datasource";

/// Body for any other server-side failure
pub const INTERNAL_MESSAGE: &str = "Unexpected internal error";

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request used a method other than GET
    #[error("Method not allowed: {0}")]
    InvalidMethod(Method),

    /// Fee aggregation failed
    #[error("Datasource error: {0}")]
    DataSource(#[from] DataSourceError),

    /// Response body could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str, &'static str) {
        match self {
            ApiError::InvalidMethod(_) => (
                StatusCode::METHOD_NOT_ALLOWED,
                "INVALID_METHOD",
                INVALID_METHOD_MESSAGE,
            ),
            ApiError::DataSource(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATASOURCE_ERROR",
                DATASOURCE_MESSAGE,
            ),
            ApiError::Serialization(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "SERIALIZATION_ERROR",
                INTERNAL_MESSAGE,
            ),
            ApiError::Io(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "IO_ERROR",
                INTERNAL_MESSAGE,
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.status_and_code();

        if status.is_server_error() {
            let request_id = uuid::Uuid::new_v4().to_string();

            tracing::error!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "API error occurred"
            );
        } else {
            tracing::debug!(error_code = %code, error_message = %self, "Rejected request");
        }

        let mut response = (
            status,
            [
                (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
                (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
            ],
            format!("{}\n", message),
        )
            .into_response();

        if status == StatusCode::METHOD_NOT_ALLOWED {
            response
                .headers_mut()
                .insert(header::ALLOW, header::HeaderValue::from_static("GET"));
        }

        response
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
