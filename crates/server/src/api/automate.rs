//! Single-job automation handler.

use axum::{extract::State, Json};
use postflow_core::{AutomationSettings, MediaDescriptor, RunJobRequest, RunJobResponse};
use serde::Deserialize;
use std::sync::Arc;

use super::error::ApiError;
use super::posts::collect_media;
use crate::state::AppState;

/// Request body for running one job outside the queue
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomateBody {
    pub username: String,
    pub password: String,
    pub post_content: String,
    #[serde(default)]
    pub images: Vec<MediaDescriptor>,
    #[serde(default)]
    pub videos: Vec<MediaDescriptor>,
    /// Falls back to the stored settings
    pub settings: Option<AutomationSettings>,
    #[serde(default)]
    pub post_index: usize,
}

/// Run one job and report its outcome.
///
/// A failed job still answers 200 with `success: false`; only rejected
/// requests produce an error status.
pub async fn automate_batch(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AutomateBody>,
) -> Result<Json<RunJobResponse>, ApiError> {
    let request = RunJobRequest {
        username: body.username,
        password: body.password,
        post_content: body.post_content,
        media: collect_media(body.images, body.videos),
        settings: body.settings,
        post_index: body.post_index,
    };

    let response = state.orchestrator().run_adhoc(request).await?;
    Ok(Json(response))
}
