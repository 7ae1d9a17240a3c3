use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;

use super::AutomationSettings;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings from {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("failed to write settings to {path}: {reason}")]
    Write { path: PathBuf, reason: String },

    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Source of automation settings.
pub trait SettingsStore: Send + Sync {
    /// Current settings. A store with nothing saved returns defaults.
    fn load(&self) -> Result<AutomationSettings, SettingsError>;

    fn save(&self, settings: &AutomationSettings) -> Result<(), SettingsError>;
}

/// Settings persisted as a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileSettingsStore {
    path: PathBuf,
}

impl JsonFileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonFileSettingsStore {
    fn load(&self) -> Result<AutomationSettings, SettingsError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(AutomationSettings::default()),
            Err(e) => {
                return Err(SettingsError::Read {
                    path: self.path.clone(),
                    reason: e.to_string(),
                })
            }
        };

        if raw.trim().is_empty() {
            return Ok(AutomationSettings::default());
        }

        serde_json::from_str(&raw).map_err(|e| SettingsError::Read {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    fn save(&self, settings: &AutomationSettings) -> Result<(), SettingsError> {
        let write_err = |reason: String| SettingsError::Write {
            path: self.path.clone(),
            reason,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;
            }
        }
        let json = serde_json::to_string_pretty(settings).map_err(|e| write_err(e.to_string()))?;
        fs::write(&self.path, json).map_err(|e| write_err(e.to_string()))
    }
}

/// Settings held in memory only.
#[derive(Debug, Default)]
pub struct InMemorySettingsStore {
    settings: Mutex<AutomationSettings>,
}

impl InMemorySettingsStore {
    pub fn new(settings: AutomationSettings) -> Self {
        Self {
            settings: Mutex::new(settings),
        }
    }
}

impl SettingsStore for InMemorySettingsStore {
    fn load(&self) -> Result<AutomationSettings, SettingsError> {
        self.settings
            .lock()
            .map(|s| s.clone())
            .map_err(|e| SettingsError::Invalid(e.to_string()))
    }

    fn save(&self, settings: &AutomationSettings) -> Result<(), SettingsError> {
        let mut guard = self
            .settings
            .lock()
            .map_err(|e| SettingsError::Invalid(e.to_string()))?;
        *guard = settings.clone();
        Ok(())
    }
}
