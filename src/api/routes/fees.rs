//! Fee Routes
//!
//! The hourly fee endpoint. Mounted as the router fallback, so every path
//! reaches it.
//!
//! - GET * - Hourly fee series as `[{"t": <hour>, "v": <fee>}, ...]`
//! - anything else - 405

use axum::{
    extract::State,
    http::{header, Method},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::ledger::AggregatedFeePoint;

/// GET *
///
/// Aggregate fees per hour and return them as indented JSON.
/// The fee source is called exactly once per accepted request.
pub async fn hourly_fees(
    State(state): State<Arc<AppState>>,
    method: Method,
) -> ApiResult<Response> {
    if method != Method::GET {
        return Err(ApiError::InvalidMethod(method));
    }

    let points = state.fees.fetch_hourly_fees().await?;
    let body = encode_points(&points)?;

    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

/// Encode points as two-space indented JSON with a trailing newline
pub fn encode_points(points: &[AggregatedFeePoint]) -> Result<Vec<u8>, serde_json::Error> {
    let mut body = serde_json::to_vec_pretty(points)?;
    body.push(b'\n');
    Ok(body)
}
