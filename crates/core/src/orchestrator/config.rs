//! Orchestrator configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the automation orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Delay between jobs when the operator settings cannot be read.
    #[serde(default = "default_post_delay")]
    pub default_post_delay_secs: u64,

    /// Capacity of the live log relay channel.
    /// Subscribers falling further behind than this lose messages.
    #[serde(default = "default_relay_capacity")]
    pub relay_capacity: usize,
}

fn default_post_delay() -> u64 {
    5
}

fn default_relay_capacity() -> usize {
    256
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            default_post_delay_secs: default_post_delay(),
            relay_capacity: default_relay_capacity(),
        }
    }
}
