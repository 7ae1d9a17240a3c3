use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use crate::orchestrator::OrchestratorConfig;
use crate::staging::StagingConfig;
use crate::worker::WorkerConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub staging: StagingConfig,
    #[serde(default)]
    pub accounts: AccountsConfig,
    #[serde(default)]
    pub settings: SettingsConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub queue: QueueConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    3000
}

/// Where worker accounts are read from.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountsConfig {
    /// CSV file with one account per line:
    /// `id,name,username,password,description,user_id,created_at,updated_at`
    #[serde(default = "default_accounts_path")]
    pub path: PathBuf,
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            path: default_accounts_path(),
        }
    }
}

fn default_accounts_path() -> PathBuf {
    PathBuf::from("accounts.txt")
}

/// Where operator automation settings are persisted.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SettingsConfig {
    #[serde(default = "default_settings_path")]
    pub path: PathBuf,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            path: default_settings_path(),
        }
    }
}

fn default_settings_path() -> PathBuf {
    PathBuf::from("automation_settings.json")
}

/// Daily automation log files.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Directory holding `automation_YYYY-MM-DD.log` files.
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,
    /// Number of lines returned by the recent-logs endpoint.
    #[serde(default = "default_recent_lines")]
    pub recent_lines: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            recent_lines: default_recent_lines(),
        }
    }
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_recent_lines() -> usize {
    50
}

/// Post queue persistence.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct QueueConfig {
    /// JSON snapshot of the queue, loaded at startup and rewritten on change.
    /// `None` keeps the queue in memory only.
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,
}

/// Config summary for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub worker: SanitizedWorkerConfig,
    pub staging: StagingConfig,
    pub orchestrator: OrchestratorConfig,
    pub logging: LoggingConfig,
    pub queue_persisted: bool,
}

/// Worker config without environment-specific paths beyond the program name.
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedWorkerConfig {
    pub program: String,
    pub script: String,
    pub turbo_script_configured: bool,
    pub timeout_secs: Option<u64>,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            worker: SanitizedWorkerConfig {
                program: config.worker.program.clone(),
                script: config.worker.script.display().to_string(),
                turbo_script_configured: config.worker.turbo_script.is_some(),
                timeout_secs: config.worker.timeout_secs,
            },
            staging: config.staging.clone(),
            orchestrator: config.orchestrator.clone(),
            logging: config.logging.clone(),
            queue_persisted: config.queue.snapshot_path.is_some(),
        }
    }
}
