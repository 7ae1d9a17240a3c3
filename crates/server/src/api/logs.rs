//! Automation log file handler.

use axum::{
    extract::{Query, State},
    Json,
};
use postflow_core::relay::read_recent;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::ApiError;
use crate::state::AppState;

/// Upper bound on lines returned in one request
const MAX_LINES: usize = 1000;

#[derive(Debug, Deserialize)]
pub struct LogsParams {
    /// Number of lines; defaults to the configured `logging.recent_lines`
    pub lines: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct LogsResponse {
    pub success: bool,
    pub lines: Vec<String>,
}

/// Most recent lines of today's automation log
pub async fn recent_logs(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LogsParams>,
) -> Result<Json<LogsResponse>, ApiError> {
    let logging = &state.config().logging;
    let limit = params.lines.unwrap_or(logging.recent_lines).min(MAX_LINES);

    let lines = read_recent(&logging.dir, limit)
        .await
        .map_err(|e| ApiError::internal(format!("failed to read automation log: {}", e)))?;
    Ok(Json(LogsResponse {
        success: true,
        lines,
    }))
}
