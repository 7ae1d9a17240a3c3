//! Mock worker for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};

use crate::relay::JobLog;
use crate::worker::{Worker, WorkerJob, WorkerResult};

/// A recorded worker run for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedJob {
    /// The job that was submitted.
    pub job: WorkerJob,
    /// Relay index the job logged under.
    pub post_index: usize,
    /// Whether every local media path existed when the worker started.
    pub media_present: bool,
}

/// Mock implementation of the Worker trait.
///
/// Provides controllable behavior for testing:
/// - Track jobs for assertions
/// - Script results per run (success by default)
/// - Emit output lines through the job log
/// - Hold jobs open until released
/// - Report the highest number of concurrent runs
///
/// # Example
///
/// ```rust,ignore
/// use postflow_core::testing::MockWorker;
///
/// let worker = MockWorker::new();
/// worker.push_result(MockWorker::exit(1, "login failed")).await;
///
/// // Hand Arc<MockWorker> to the orchestrator, run a batch...
///
/// let jobs = worker.recorded_jobs().await;
/// assert_eq!(jobs.len(), 1);
/// ```
#[derive(Debug)]
pub struct MockWorker {
    jobs: Arc<RwLock<Vec<RecordedJob>>>,
    /// Results returned in order; empty means success.
    results: Arc<RwLock<VecDeque<WorkerResult>>>,
    /// Lines emitted as stdout for every run.
    output: Arc<RwLock<Vec<String>>>,
    /// Simulated run duration in milliseconds.
    run_duration_ms: Arc<RwLock<u64>>,
    /// While `true`, runs wait before returning.
    gate: watch::Sender<bool>,
    active: Arc<AtomicUsize>,
    max_active: Arc<AtomicUsize>,
}

impl Default for MockWorker {
    fn default() -> Self {
        Self::new()
    }
}

impl MockWorker {
    /// Create a new mock worker that succeeds immediately.
    pub fn new() -> Self {
        let (gate, _) = watch::channel(false);
        Self {
            jobs: Arc::new(RwLock::new(Vec::new())),
            results: Arc::new(RwLock::new(VecDeque::new())),
            output: Arc::new(RwLock::new(Vec::new())),
            run_duration_ms: Arc::new(RwLock::new(0)),
            gate,
            active: Arc::new(AtomicUsize::new(0)),
            max_active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A successful result with the given stdout.
    pub fn success(stdout: &str) -> WorkerResult {
        WorkerResult::Exited {
            exit_code: 0,
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    /// A nonzero exit with the given stderr.
    pub fn exit(exit_code: i32, stderr: &str) -> WorkerResult {
        WorkerResult::Exited {
            exit_code,
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }

    /// Get all recorded jobs.
    pub async fn recorded_jobs(&self) -> Vec<RecordedJob> {
        self.jobs.read().await.clone()
    }

    /// Get the number of runs performed.
    pub async fn run_count(&self) -> usize {
        self.jobs.read().await.len()
    }

    /// Queue a result for the next run.
    pub async fn push_result(&self, result: WorkerResult) {
        self.results.write().await.push_back(result);
    }

    /// Lines emitted on every run.
    pub async fn set_output(&self, lines: &[&str]) {
        *self.output.write().await = lines.iter().map(|l| l.to_string()).collect();
    }

    /// Set the simulated run duration.
    pub async fn set_run_duration(&self, duration: Duration) {
        *self.run_duration_ms.write().await = duration.as_millis() as u64;
    }

    /// Make subsequent runs wait until [`release`](Self::release).
    pub fn hold(&self) {
        self.gate.send_replace(true);
    }

    /// Let held runs finish.
    pub fn release(&self) {
        self.gate.send_replace(false);
    }

    /// Number of runs currently in progress.
    pub fn active_runs(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Highest number of overlapping runs observed.
    pub fn max_concurrent_runs(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    /// Wait until a run is in progress or `timeout` elapses.
    pub async fn wait_for_active(&self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if self.active_runs() > 0 {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        false
    }
}

fn is_local(locator: &str) -> bool {
    !(locator.starts_with("http://") || locator.starts_with("https://"))
}

#[async_trait]
impl Worker for MockWorker {
    fn name(&self) -> &str {
        "mock"
    }

    async fn run(&self, job: WorkerJob, log: JobLog) -> WorkerResult {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);

        let media_present = job
            .images
            .iter()
            .chain(job.videos.iter())
            .filter(|m| is_local(m))
            .all(|m| Path::new(m).exists());

        self.jobs.write().await.push(RecordedJob {
            job,
            post_index: log.post_index(),
            media_present,
        });

        for line in self.output.read().await.iter() {
            log.info(line.clone());
        }

        let duration_ms = *self.run_duration_ms.read().await;
        if duration_ms > 0 {
            tokio::time::sleep(Duration::from_millis(duration_ms)).await;
        }

        let mut gate = self.gate.subscribe();
        let _ = gate.wait_for(|held| !*held).await;

        let result = self
            .results
            .write()
            .await
            .pop_front()
            .unwrap_or_else(|| Self::success("done"));

        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::LogRelay;
    use crate::settings::AutomationSettings;

    fn job() -> WorkerJob {
        WorkerJob {
            username: "alice".to_string(),
            password: "secret".to_string(),
            content: "hello".to_string(),
            images: vec!["/nonexistent/a.jpg".to_string()],
            videos: vec!["https://example.com/v.mp4".to_string()],
            settings: AutomationSettings::default(),
        }
    }

    #[tokio::test]
    async fn test_scripted_results_in_order() {
        let worker = MockWorker::new();
        worker.push_result(MockWorker::exit(2, "boom")).await;
        let relay = LogRelay::new(16);

        let first = worker.run(job(), relay.for_job(0)).await;
        let second = worker.run(job(), relay.for_job(1)).await;

        assert!(!first.is_success());
        assert!(second.is_success());

        let jobs = worker.recorded_jobs().await;
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[1].post_index, 1);
        assert!(!jobs[0].media_present);
    }

    #[tokio::test]
    async fn test_output_lines_are_relayed() {
        let worker = MockWorker::new();
        worker.set_output(&["Logging in", "Posted"]).await;
        let relay = LogRelay::new(16);
        let mut rx = relay.subscribe();

        worker.run(job(), relay.for_job(4)).await;

        let first = rx.recv().await.unwrap();
        assert!(matches!(
            first,
            crate::relay::RelayMessage::Log { post_index: 4, ref message, .. }
                if message == "Logging in"
        ));
    }
}
