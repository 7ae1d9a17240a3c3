//! Media upload handlers.
//!
//! Uploads arrive as the raw request body and are kept in the uploads
//! directory, which is served under the uploads URL prefix. The returned
//! URL can be attached to posts as an image or video.

use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use postflow_core::MediaKind;
use serde::Serialize;
use std::sync::Arc;

use super::error::ApiError;
use crate::state::AppState;

/// Largest accepted upload body.
pub const MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub url: String,
}

async fn store(
    state: &AppState,
    kind: MediaKind,
    body: Bytes,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let stored = state.staging().store_upload(kind, &body).await?;
    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            success: true,
            url: stored.url,
        }),
    ))
}

pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    store(&state, MediaKind::Image, body).await
}

pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    store(&state, MediaKind::Video, body).await
}
