//! Worker supervisor: runs the external automation worker for one job.
//!
//! The [`Worker`] trait is the seam the orchestrator depends on.
//! [`ProcessWorker`] spawns the configured program with the job's
//! arguments, relays stdout/stderr line by line through a [`JobLog`], and
//! resolves to a [`WorkerResult`] once the process exits.
//!
//! [`JobLog`]: crate::relay::JobLog

mod config;
mod process;
mod traits;
mod types;

pub use config::WorkerConfig;
pub use process::ProcessWorker;
pub use traits::Worker;
pub use types::{WorkerJob, WorkerResult};
