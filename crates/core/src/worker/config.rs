//! Configuration for the worker supervisor.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::settings::Speed;

/// How the external automation worker is launched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Interpreter or executable. `PYTHON_PATH` overrides this at load time.
    #[serde(default = "default_program")]
    pub program: String,

    /// Script passed as the first argument.
    #[serde(default = "default_script")]
    pub script: PathBuf,

    /// Script used instead of `script` when settings ask for `fast` speed.
    #[serde(default)]
    pub turbo_script: Option<PathBuf>,

    /// Working directory of the worker process. Defaults to the server's.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,

    /// Kill the worker after this many seconds. `None` waits indefinitely.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_program() -> String {
    "python".to_string()
}

fn default_script() -> PathBuf {
    PathBuf::from("automation_fixed.py")
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            script: default_script(),
            turbo_script: None,
            working_dir: None,
            timeout_secs: None,
        }
    }
}

impl WorkerConfig {
    /// Script to run for the given speed.
    pub fn script_for(&self, speed: Speed) -> &Path {
        match (speed, &self.turbo_script) {
            (Speed::Fast, Some(turbo)) => turbo,
            _ => &self.script,
        }
    }
}
