use std::path::PathBuf;
use thiserror::Error;

use crate::post::MediaKind;

#[derive(Debug, Error)]
pub enum StagingError {
    /// More than one item of a kind was attached to a single job.
    #[error("at most one {kind} per post is supported, got {count}")]
    MediaLimitExceeded { kind: MediaKind, count: usize },

    #[error("invalid inline {kind} payload: {reason}")]
    InvalidInline { kind: MediaKind, reason: String },

    #[error("staged file not found: {path}")]
    SourceMissing { path: PathBuf },

    #[error("invalid media path: {0}")]
    InvalidPath(String),

    #[error("upload is empty")]
    EmptyUpload,

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StagingError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StagingError::Io {
            path: path.into(),
            source,
        }
    }
}
