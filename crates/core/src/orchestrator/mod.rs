//! Automation orchestrator for batch post processing.
//!
//! The orchestrator drives posts through the status state machine:
//! - **Batch**: one loop, one job at a time, a configurable delay between jobs
//! - **Ad-hoc**: a single job outside the queue, sharing the same job slot
//! - **Stop**: cooperative; the in-flight job always reaches a terminal status

mod config;
mod runner;
mod types;

pub use config::OrchestratorConfig;
pub use runner::AutomationOrchestrator;
pub use types::{
    ImportSummary, JobError, OrchestratorError, OrchestratorStatus, RunJobRequest, RunJobResponse,
    StartOutcome,
};
