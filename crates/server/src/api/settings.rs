//! Automation settings handlers.

use axum::{extract::State, Json};
use postflow_core::AutomationSettings;
use serde::Serialize;
use std::sync::Arc;

use super::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub success: bool,
    pub settings: AutomationSettings,
}

#[derive(Debug, Serialize)]
pub struct SaveSettingsResponse {
    pub success: bool,
    pub message: String,
}

/// Get the stored settings, or defaults if none were saved
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SettingsResponse>, ApiError> {
    let settings = state.settings().load()?;
    Ok(Json(SettingsResponse {
        success: true,
        settings,
    }))
}

/// Replace the stored settings. Takes effect from the next job.
pub async fn save_settings(
    State(state): State<Arc<AppState>>,
    Json(settings): Json<AutomationSettings>,
) -> Result<Json<SaveSettingsResponse>, ApiError> {
    state.settings().save(&settings)?;
    tracing::info!(?settings, "Automation settings saved");
    Ok(Json(SaveSettingsResponse {
        success: true,
        message: "Settings saved".to_string(),
    }))
}
