//! Batch automation control handlers.

use axum::{extract::State, Json};
use postflow_core::{OrchestratorStatus, StartOutcome};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::ApiError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub success: bool,
    #[serde(flatten)]
    pub status: OrchestratorStatus,
}

#[derive(Debug, Serialize)]
pub struct StartResponse {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub outcome: StartOutcome,
}

/// Simple message response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

/// Request body for resetting post statuses
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetBody {
    #[serde(default)]
    pub keep_completed: bool,
}

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub success: bool,
    pub reset: usize,
}

// ============================================================================
// Handlers
// ============================================================================

/// Get automation status
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        success: true,
        status: state.orchestrator().status().await,
    })
}

/// Start processing eligible posts
pub async fn start(State(state): State<Arc<AppState>>) -> Result<Json<StartResponse>, ApiError> {
    let outcome = state.orchestrator().start().await?;
    let message = match outcome {
        StartOutcome::Started { total } => format!("Automation started for {} posts", total),
        StartOutcome::AlreadyRunning => "Automation already running".to_string(),
    };
    Ok(Json(StartResponse {
        success: true,
        message,
        outcome,
    }))
}

/// Stop after the in-flight job
pub async fn stop(State(state): State<Arc<AppState>>) -> Json<MessageResponse> {
    let message = if state.orchestrator().stop() {
        "Automation stopping after the current post"
    } else {
        "Automation not running"
    };
    Json(MessageResponse {
        success: true,
        message: message.to_string(),
    })
}

/// Return posts to pending
pub async fn reset(
    State(state): State<Arc<AppState>>,
    body: Option<Json<ResetBody>>,
) -> Result<Json<ResetResponse>, ApiError> {
    let Json(body) = body.unwrap_or_default();
    let reset = state.orchestrator().reset(body.keep_completed).await?;
    Ok(Json(ResetResponse {
        success: true,
        reset,
    }))
}
