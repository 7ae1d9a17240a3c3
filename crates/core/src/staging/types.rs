use std::io::ErrorKind;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, warn};

use crate::metrics::CLEANUP_FAILURES;

/// Locators ready to hand to the worker, plus ownership of any files
/// written to produce them.
#[derive(Debug)]
pub struct StagedMedia {
    pub images: Vec<String>,
    pub videos: Vec<String>,
    pub cleanup: CleanupHandle,
}

/// Files written for one job.
///
/// Pass it to [`MediaStagingManager::cleanup`] once the worker has exited.
/// Any files still owned when the handle is dropped are removed
/// synchronously.
///
/// [`MediaStagingManager::cleanup`]: super::MediaStagingManager::cleanup
#[derive(Debug, Default)]
pub struct CleanupHandle {
    paths: Vec<PathBuf>,
}

impl CleanupHandle {
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub(crate) fn push(&mut self, path: PathBuf) {
        self.paths.push(path);
    }

    pub(crate) fn take(&mut self) -> Vec<PathBuf> {
        std::mem::take(&mut self.paths)
    }
}

impl Drop for CleanupHandle {
    fn drop(&mut self) {
        for path in self.paths.drain(..) {
            match std::fs::remove_file(&path) {
                Ok(()) => debug!(path = %path.display(), "Removed staged file on drop"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    CLEANUP_FAILURES.inc();
                    warn!(path = %path.display(), error = %e, "Failed to remove staged file");
                }
            }
        }
    }
}

/// Outcome of a cleanup pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub removed: usize,
    /// Already gone before cleanup ran.
    pub missing: usize,
    pub failed: usize,
}

/// An operator upload kept in the uploads directory.
#[derive(Debug, Clone, Serialize)]
pub struct StoredUpload {
    /// Locator to attach to posts, e.g. `/uploads/<name>.jpg`.
    pub url: String,
    #[serde(skip)]
    pub path: PathBuf,
}
