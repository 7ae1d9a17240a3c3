use serde::{Deserialize, Serialize};

use crate::post::PostStatus;

/// Severity of a relayed log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Error => "error",
        }
    }
}

/// Message published on the relay.
///
/// Serialized with an `event` tag so the log variant can carry its level
/// under `type`: `{"event":"log","postIndex":0,"message":"...","type":"info"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum RelayMessage {
    /// A line of worker or orchestrator output for one job.
    Log {
        post_index: usize,
        message: String,
        #[serde(rename = "type")]
        level: LogLevel,
    },
    /// A post changed status.
    PostStatus { post_id: String, status: PostStatus },
    /// Batch progress after a job reached a terminal status.
    Progress {
        percent: f64,
        processed: usize,
        total: usize,
    },
    /// The batch loop started or stopped.
    Automation { running: bool },
    /// The batch ran out of eligible posts.
    Finished { completed: usize, failed: usize },
}

impl RelayMessage {
    /// Short name used for metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayMessage::Log { .. } => "log",
            RelayMessage::PostStatus { .. } => "post_status",
            RelayMessage::Progress { .. } => "progress",
            RelayMessage::Automation { .. } => "automation",
            RelayMessage::Finished { .. } => "finished",
        }
    }
}
