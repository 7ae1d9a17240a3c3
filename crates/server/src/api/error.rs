//! JSON error responses shared by the API handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use postflow_core::{AccountError, OrchestratorError, PostError, SettingsError, StagingError};

/// Error body: `{"success": false, "error": "..."}`
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

/// An error status plus message, rendered as [`ErrorResponse`].
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, "{}", self.message);
        }
        (
            self.status,
            Json(ErrorResponse {
                success: false,
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<PostError> for ApiError {
    fn from(e: PostError) -> Self {
        let status = match &e {
            PostError::Validation(_) => StatusCode::BAD_REQUEST,
            PostError::NotFound(_) => StatusCode::NOT_FOUND,
            PostError::Locked { .. }
            | PostError::InvalidTransition { .. }
            | PostError::SingleFlightViolation { .. } => StatusCode::CONFLICT,
            PostError::Snapshot(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, e.to_string())
    }
}

impl From<OrchestratorError> for ApiError {
    fn from(e: OrchestratorError) -> Self {
        match e {
            OrchestratorError::Post(e) => e.into(),
            OrchestratorError::InvalidRequest(_) => Self::bad_request(e.to_string()),
            OrchestratorError::EmptyQueue | OrchestratorError::Busy(_) => {
                Self::new(StatusCode::CONFLICT, e.to_string())
            }
        }
    }
}

impl From<StagingError> for ApiError {
    fn from(e: StagingError) -> Self {
        match e {
            StagingError::Io { .. } => Self::internal(e.to_string()),
            _ => Self::bad_request(e.to_string()),
        }
    }
}

impl From<SettingsError> for ApiError {
    fn from(e: SettingsError) -> Self {
        match e {
            SettingsError::Invalid(_) => Self::bad_request(e.to_string()),
            _ => Self::internal(e.to_string()),
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(e: AccountError) -> Self {
        Self::internal(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_error_status_mapping() {
        assert_eq!(
            ApiError::from(PostError::NotFound("x".to_string())).status,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(PostError::Validation("empty".to_string())).status,
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_orchestrator_busy_is_conflict() {
        let err = ApiError::from(OrchestratorError::Busy("running"));
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert!(err.message.contains("running"));
    }
}
