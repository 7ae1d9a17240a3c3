use std::sync::Arc;

use postflow_core::{
    AccountDirectory, AutomationOrchestrator, Config, LogRelay, MediaStagingManager,
    SanitizedConfig, SettingsStore, SharedQueue,
};

/// Shared application state
pub struct AppState {
    config: Config,
    orchestrator: AutomationOrchestrator,
    accounts: Arc<dyn AccountDirectory>,
    settings: Arc<dyn SettingsStore>,
    staging: Arc<MediaStagingManager>,
}

impl AppState {
    pub fn new(
        config: Config,
        orchestrator: AutomationOrchestrator,
        accounts: Arc<dyn AccountDirectory>,
        settings: Arc<dyn SettingsStore>,
        staging: Arc<MediaStagingManager>,
    ) -> Self {
        Self {
            config,
            orchestrator,
            accounts,
            settings,
            staging,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn orchestrator(&self) -> &AutomationOrchestrator {
        &self.orchestrator
    }

    /// The post queue the orchestrator works from.
    pub fn queue(&self) -> &SharedQueue {
        self.orchestrator.queue()
    }

    pub fn relay(&self) -> &LogRelay {
        self.orchestrator.relay()
    }

    pub fn accounts(&self) -> &dyn AccountDirectory {
        self.accounts.as_ref()
    }

    pub fn settings(&self) -> &dyn SettingsStore {
        self.settings.as_ref()
    }

    pub fn staging(&self) -> &MediaStagingManager {
        &self.staging
    }
}
