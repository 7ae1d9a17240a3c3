//! Trait definitions for the worker supervisor.

use async_trait::async_trait;

use super::types::{WorkerJob, WorkerResult};
use crate::relay::JobLog;

/// Runs one automation job to completion.
#[async_trait]
pub trait Worker: Send + Sync {
    /// Returns the name of this worker implementation.
    fn name(&self) -> &str;

    /// Run the job, forwarding output lines to `log` as they arrive.
    ///
    /// Never fails: spawn errors, nonzero exits, and timeouts are all
    /// reported through the returned [`WorkerResult`].
    async fn run(&self, job: WorkerJob, log: JobLog) -> WorkerResult;
}
