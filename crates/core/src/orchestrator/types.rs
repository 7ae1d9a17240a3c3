//! Types for the automation orchestrator.

use serde::Serialize;
use thiserror::Error;

use crate::account::AccountError;
use crate::post::{MediaRef, PostError, StatusCounts};
use crate::settings::AutomationSettings;
use crate::staging::StagingError;
use crate::worker::WorkerResult;

/// Errors returned by orchestrator operations.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("no eligible posts to process")]
    EmptyQueue,

    #[error("automation is busy: {0}")]
    Busy(&'static str),

    #[error("invalid job request: {0}")]
    InvalidRequest(String),

    #[error("post queue error: {0}")]
    Post(#[from] PostError),
}

/// Why a single job failed. Caught by the orchestrator and recorded on the
/// post; never aborts the batch.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("account not found: {0}")]
    AccountNotFound(String),

    #[error("account lookup failed: {0}")]
    AccountLookup(#[from] AccountError),

    #[error("media staging failed: {0}")]
    Staging(#[from] StagingError),

    #[error("failed to start worker: {0}")]
    WorkerSpawn(String),

    #[error("worker exited with code {exit_code}{}", detail_suffix(.detail))]
    WorkerExit {
        exit_code: i32,
        /// Last non-empty stderr line.
        detail: Option<String>,
    },

    #[error("worker timed out after {timeout_secs} seconds")]
    WorkerTimeout { timeout_secs: u64 },
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(d) => format!(": {}", d),
        None => String::new(),
    }
}

impl JobError {
    /// Map an unsuccessful worker result. Returns `None` on success.
    pub fn from_result(result: &WorkerResult) -> Option<Self> {
        match result {
            WorkerResult::Exited { exit_code: 0, .. } => None,
            WorkerResult::Exited {
                exit_code, stderr, ..
            } => Some(JobError::WorkerExit {
                exit_code: *exit_code,
                detail: stderr
                    .lines()
                    .rev()
                    .map(str::trim)
                    .find(|l| !l.is_empty())
                    .map(String::from),
            }),
            WorkerResult::SpawnFailed { error } => Some(JobError::WorkerSpawn(error.clone())),
            WorkerResult::TimedOut { timeout_secs, .. } => Some(JobError::WorkerTimeout {
                timeout_secs: *timeout_secs,
            }),
        }
    }

    /// Label used in metrics.
    pub fn cause(&self) -> &'static str {
        match self {
            JobError::AccountNotFound(_) | JobError::AccountLookup(_) => "account",
            JobError::Staging(_) => "staging",
            JobError::WorkerSpawn(_) => "spawn",
            JobError::WorkerExit { .. } => "exit",
            JobError::WorkerTimeout { .. } => "timeout",
        }
    }
}

/// Result of [`AutomationOrchestrator::start`].
///
/// [`AutomationOrchestrator::start`]: super::AutomationOrchestrator::start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StartOutcome {
    Started { total: usize },
    AlreadyRunning,
}

/// Result of [`AutomationOrchestrator::import`].
///
/// [`AutomationOrchestrator::import`]: super::AutomationOrchestrator::import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Posts added to the queue.
    pub imported: usize,
    /// Queue length afterwards.
    pub total: usize,
}

/// Current status of the orchestrator.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestratorStatus {
    /// Whether the batch loop will claim another job.
    pub running: bool,
    /// Stopped, but the in-flight job has not finished yet.
    pub draining: bool,
    /// Post currently processing.
    pub current_post_id: Option<String>,
    pub progress: f64,
    pub processed: usize,
    /// Eligible posts when the run started.
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub counts: StatusCounts,
}

/// One job run outside the queue.
#[derive(Clone)]
pub struct RunJobRequest {
    pub username: String,
    pub password: String,
    pub post_content: String,
    pub media: Vec<MediaRef>,
    /// Defaults to the stored settings.
    pub settings: Option<AutomationSettings>,
    pub post_index: usize,
}

impl std::fmt::Debug for RunJobRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunJobRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("media", &self.media)
            .field("post_index", &self.post_index)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunJobResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub output: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub error_output: String,
    pub post_index: usize,
}
