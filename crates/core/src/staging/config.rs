use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where job media is staged and operator uploads are kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagingConfig {
    /// Per-job files decoded from inline payloads. Emptied by cleanup.
    #[serde(default = "default_dir")]
    pub dir: PathBuf,

    /// Operator uploads. Never touched by cleanup.
    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: PathBuf,

    /// URL prefix under which uploads are served and referenced.
    #[serde(default = "default_uploads_url_prefix")]
    pub uploads_url_prefix: String,
}

fn default_dir() -> PathBuf {
    PathBuf::from("temp/staging")
}

fn default_uploads_dir() -> PathBuf {
    PathBuf::from("temp/uploads")
}

fn default_uploads_url_prefix() -> String {
    "/uploads".to_string()
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            uploads_dir: default_uploads_dir(),
            uploads_url_prefix: default_uploads_url_prefix(),
        }
    }
}
