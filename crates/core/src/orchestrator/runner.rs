//! Automation orchestrator implementation.
//!
//! Drives posts through the status state machine one at a time:
//! claim the next eligible post, resolve its account, stage media, run the
//! worker, record the terminal status, clean up, wait, repeat.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::{Mutex as AsyncMutex, Notify};
use tracing::{debug, error, info, warn};

use crate::account::AccountDirectory;
use crate::metrics::{JOBS_TOTAL, JOB_FAILURES};
use crate::post::{ImportMode, MediaRef, Post, PostStatus, SharedQueue};
use crate::relay::{JobLog, LogRelay};
use crate::settings::{AutomationSettings, SettingsStore};
use crate::staging::{MediaStagingManager, StagedMedia};
use crate::worker::{Worker, WorkerJob, WorkerResult};

use super::config::OrchestratorConfig;
use super::types::{
    ImportSummary, JobError, OrchestratorError, OrchestratorStatus, RunJobRequest, RunJobResponse,
    StartOutcome,
};

/// Run state guarded by a sync mutex. Never held across an await.
#[derive(Debug, Default)]
struct LoopState {
    /// Loop may claim another job.
    running: bool,
    /// A loop task exists (it may be draining after a stop).
    loop_active: bool,
    /// Bumped by every successful start so a resumed loop forgets the
    /// previous run's attempted set.
    generation: u64,
    total: usize,
    processed: usize,
    completed: usize,
    failed: usize,
}

impl LoopState {
    fn percent(&self) -> f64 {
        let pct = self.processed as f64 / self.total.max(1) as f64 * 100.0;
        pct.min(100.0)
    }
}

struct Shared {
    config: OrchestratorConfig,
    queue: SharedQueue,
    accounts: Arc<dyn AccountDirectory>,
    settings: Arc<dyn SettingsStore>,
    staging: Arc<MediaStagingManager>,
    worker: Arc<dyn Worker>,
    relay: LogRelay,

    state: Mutex<LoopState>,
    /// Held for the duration of every job, batch or ad-hoc.
    job_slot: AsyncMutex<()>,
    /// Cuts the inter-job delay short on stop.
    wake: Notify,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, LoopState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn settings_snapshot(&self) -> AutomationSettings {
        match self.settings.load() {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to load automation settings, using defaults: {}", e);
                AutomationSettings {
                    post_delay_seconds: self.config.default_post_delay_secs,
                    ..AutomationSettings::default()
                }
            }
        }
    }
}

enum Claim {
    Job(Post, usize),
    Skipped(String),
    Exhausted,
}

/// The automation orchestrator: sole writer of post processing status.
///
/// Cloning yields another handle to the same orchestrator.
#[derive(Clone)]
pub struct AutomationOrchestrator {
    inner: Arc<Shared>,
}

impl AutomationOrchestrator {
    /// Create a new orchestrator.
    pub fn new(
        config: OrchestratorConfig,
        queue: SharedQueue,
        accounts: Arc<dyn AccountDirectory>,
        settings: Arc<dyn SettingsStore>,
        staging: Arc<MediaStagingManager>,
        worker: Arc<dyn Worker>,
        relay: LogRelay,
    ) -> Self {
        Self {
            inner: Arc::new(Shared {
                config,
                queue,
                accounts,
                settings,
                staging,
                worker,
                relay,
                state: Mutex::new(LoopState::default()),
                job_slot: AsyncMutex::new(()),
                wake: Notify::new(),
            }),
        }
    }

    pub fn relay(&self) -> &LogRelay {
        &self.inner.relay
    }

    pub fn queue(&self) -> &SharedQueue {
        &self.inner.queue
    }

    /// Start processing eligible posts.
    ///
    /// A no-op when already running. If a stopped loop is still finishing
    /// its in-flight job, that loop carries on with the new run instead of a
    /// second loop being spawned.
    pub async fn start(&self) -> Result<StartOutcome, OrchestratorError> {
        let queue = self.inner.queue.read().await;

        let (total, spawn) = {
            let mut state = self.inner.state();
            if state.running {
                debug!("Automation already running");
                return Ok(StartOutcome::AlreadyRunning);
            }

            let total = queue.eligible_count();
            if total == 0 {
                return Err(OrchestratorError::EmptyQueue);
            }

            state.running = true;
            state.generation += 1;
            state.total = total;
            state.processed = 0;
            state.completed = 0;
            state.failed = 0;

            let spawn = !state.loop_active;
            state.loop_active = true;
            (total, spawn)
        };
        drop(queue);

        info!(total, "Starting automation");
        self.inner.relay.automation(true);
        self.inner.relay.progress(0.0, 0, total);

        if spawn {
            let inner = Arc::clone(&self.inner);
            tokio::spawn(Self::run_loop(inner));
        } else {
            info!("Resuming loop that was still finishing its previous job");
        }

        Ok(StartOutcome::Started { total })
    }

    /// Stop claiming new jobs. The in-flight job, if any, runs to its
    /// terminal status. Idempotent; returns whether the loop was running.
    pub fn stop(&self) -> bool {
        let was_running = std::mem::replace(&mut self.inner.state().running, false);
        if was_running {
            info!("Stopping automation");
            self.inner.relay.automation(false);
            self.inner.wake.notify_waiters();
        } else {
            debug!("Automation not running");
        }
        was_running
    }

    /// Return posts to `pending` (all of them, or all but completed).
    ///
    /// Rejected while running or while a stopped loop is still finishing.
    pub async fn reset(&self, keep_completed: bool) -> Result<usize, OrchestratorError> {
        let mut queue = self.inner.queue.write().await;
        {
            let mut state = self.inner.state();
            if state.running || state.loop_active || queue.processing().is_some() {
                return Err(OrchestratorError::Busy("cannot reset while automation is active"));
            }
            state.total = 0;
            state.processed = 0;
            state.completed = 0;
            state.failed = 0;
        }

        let changed = queue.reset_statuses(keep_completed);
        drop(queue);

        info!(changed, keep_completed, "Post statuses reset");
        self.inner.relay.progress(0.0, 0, 0);
        Ok(changed)
    }

    /// Import posts into the queue.
    ///
    /// Rejected while running or while a stopped loop is still finishing, so
    /// a run never sees its posts replaced underneath it.
    pub async fn import(
        &self,
        posts: Vec<Post>,
        mode: ImportMode,
    ) -> Result<ImportSummary, OrchestratorError> {
        let mut queue = self.inner.queue.write().await;
        {
            let state = self.inner.state();
            if state.running || state.loop_active {
                return Err(OrchestratorError::Busy("cannot import while automation is active"));
            }
        }

        let imported = queue.import(posts, mode)?;
        info!(imported, ?mode, "Posts imported");
        Ok(ImportSummary {
            imported,
            total: queue.len(),
        })
    }

    pub async fn status(&self) -> OrchestratorStatus {
        let (counts, current_post_id) = {
            let queue = self.inner.queue.read().await;
            (queue.counts(), queue.processing().map(|p| p.id.clone()))
        };
        let state = self.inner.state();

        OrchestratorStatus {
            running: state.running,
            draining: !state.running && state.loop_active,
            current_post_id,
            progress: state.percent(),
            processed: state.processed,
            total: state.total,
            completed: state.completed,
            failed: state.failed,
            counts,
        }
    }

    /// Run one job outside the queue: stage, run the worker, clean up.
    ///
    /// Rejected while the batch loop is active or another job holds the slot.
    pub async fn run_adhoc(
        &self,
        request: RunJobRequest,
    ) -> Result<RunJobResponse, OrchestratorError> {
        if request.username.trim().is_empty() {
            return Err(OrchestratorError::InvalidRequest(
                "username is required".to_string(),
            ));
        }
        if request.post_content.trim().is_empty() {
            return Err(OrchestratorError::InvalidRequest(
                "post content cannot be empty".to_string(),
            ));
        }

        {
            let state = self.inner.state();
            if state.running || state.loop_active {
                return Err(OrchestratorError::Busy("batch automation is running"));
            }
        }
        let Ok(_slot) = self.inner.job_slot.try_lock() else {
            return Err(OrchestratorError::Busy("another job is in progress"));
        };

        let post_index = request.post_index;
        let log = self.inner.relay.for_job(post_index);
        let settings = match request.settings {
            Some(settings) => settings,
            None => self.inner.settings_snapshot(),
        };

        info!(post_index, "Running ad-hoc job");
        log.info(format!("Starting post {}", post_index + 1));

        let job = WorkerJob {
            username: request.username,
            password: request.password,
            content: request.post_content,
            images: Vec::new(),
            videos: Vec::new(),
            settings,
        };

        let response = match Self::run_worker(&self.inner, job, &request.media, &log).await {
            Ok(result) => match JobError::from_result(&result) {
                None => {
                    log.info(format!("Post {} completed", post_index + 1));
                    RunJobResponse {
                        success: true,
                        message: Some(format!("post {} completed", post_index + 1)),
                        error: None,
                        output: result.stdout().to_string(),
                        error_output: String::new(),
                        post_index,
                    }
                }
                Some(err) => {
                    log.error(format!("Post {} failed: {}", post_index + 1, err));
                    RunJobResponse {
                        success: false,
                        message: None,
                        error: Some(err.to_string()),
                        output: result.stdout().to_string(),
                        error_output: result.stderr().to_string(),
                        post_index,
                    }
                }
            },
            Err(err) => {
                log.error(format!("Post {} failed: {}", post_index + 1, err));
                RunJobResponse {
                    success: false,
                    message: None,
                    error: Some(err.to_string()),
                    output: String::new(),
                    error_output: String::new(),
                    post_index,
                }
            }
        };

        Ok(response)
    }

    // ------------------------------------------------------------------------
    // Loop
    // ------------------------------------------------------------------------

    async fn run_loop(inner: Arc<Shared>) {
        info!("Automation loop started");
        let _guard = LoopGuard(Arc::clone(&inner));
        let mut attempted: HashSet<String> = HashSet::new();
        let mut generation = inner.state().generation;
        // Post whose job straddled a restart. It was not eligible when the
        // new run started, so the new run must not pick it up again.
        let mut carried: Option<String> = None;

        loop {
            {
                let mut state = inner.state();
                if !state.running {
                    state.loop_active = false;
                    break;
                }
                if state.generation != generation {
                    attempted.clear();
                    attempted.extend(carried.take());
                    generation = state.generation;
                }
            }

            let slot = inner.job_slot.lock().await;

            let (post, index) = match Self::claim_next(&inner, &attempted).await {
                Claim::Job(post, index) => (post, index),
                Claim::Skipped(id) => {
                    attempted.insert(id);
                    continue;
                }
                Claim::Exhausted => {
                    drop(slot);
                    let mut state = inner.state();
                    if state.generation != generation {
                        // Restarted since the lease check; go around again.
                        continue;
                    }
                    let (completed, failed) = (state.completed, state.failed);
                    info!(completed, failed, "Automation finished");
                    // Published under the lock so observers see the events
                    // before the loop reports idle.
                    inner.relay.finished(completed, failed);
                    inner.relay.automation(false);
                    state.running = false;
                    state.loop_active = false;
                    break;
                }
            };

            inner.relay.post_status(&post.id, PostStatus::Processing);
            let outcome = Self::execute(&inner, &post, index).await;
            let recorded = Self::record_outcome(&inner, &post, index, outcome).await;
            attempted.insert(post.id.clone());
            drop(slot);

            {
                let mut state = inner.state();
                // A job claimed before a restart does not count toward the new run.
                if state.generation == generation {
                    state.processed += 1;
                    match recorded {
                        Some(PostStatus::Completed) => state.completed += 1,
                        Some(_) => state.failed += 1,
                        None => {}
                    }
                } else {
                    carried = Some(post.id.clone());
                }
                let (percent, processed, total) = (state.percent(), state.processed, state.total);
                drop(state);
                inner.relay.progress(percent, processed, total);
            }

            let more = inner
                .queue
                .read()
                .await
                .next_eligible_excluding(&attempted)
                .is_some();
            if more {
                Self::delay(&inner).await;
            }
        }

        info!("Automation loop stopped");
    }

    async fn claim_next(inner: &Shared, attempted: &HashSet<String>) -> Claim {
        let mut queue = inner.queue.write().await;
        let Some(id) = queue.next_eligible_excluding(attempted).map(|p| p.id.clone()) else {
            return Claim::Exhausted;
        };
        let index = queue.position(&id).unwrap_or_default();

        match queue.mark_processing(&id) {
            Ok(post) => Claim::Job(post, index),
            Err(e) => {
                error!(post_id = %id, "Failed to claim post: {}", e);
                Claim::Skipped(id)
            }
        }
    }

    async fn execute(inner: &Shared, post: &Post, index: usize) -> Result<(), JobError> {
        let log = inner.relay.for_job(index);
        info!(post_id = %post.id, post_index = index, "Processing post");
        log.info(format!("Starting post {}", index + 1));

        let account = inner
            .accounts
            .resolve(&post.account_ref)?
            .ok_or_else(|| JobError::AccountNotFound(post.account_ref.clone()))?;

        let job = WorkerJob {
            username: account.username,
            password: account.password,
            content: post.content.clone(),
            images: Vec::new(),
            videos: Vec::new(),
            settings: inner.settings_snapshot(),
        };

        let result = Self::run_worker(inner, job, &post.media, &log).await?;
        match JobError::from_result(&result) {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }

    /// Stage media, run the worker, and always clean up what was staged.
    async fn run_worker(
        inner: &Shared,
        mut job: WorkerJob,
        media: &[MediaRef],
        log: &JobLog,
    ) -> Result<WorkerResult, JobError> {
        let StagedMedia {
            images,
            videos,
            cleanup,
        } = inner.staging.stage(media).await?;
        job.images = images;
        job.videos = videos;

        let result = inner.worker.run(job, log.clone()).await;

        let report = inner.staging.cleanup(cleanup).await;
        if report.failed > 0 {
            warn!(failed = report.failed, "Some staged files could not be removed");
        }

        Ok(result)
    }

    async fn record_outcome(
        inner: &Shared,
        post: &Post,
        index: usize,
        outcome: Result<(), JobError>,
    ) -> Option<PostStatus> {
        let log = inner.relay.for_job(index);
        let mut queue = inner.queue.write().await;

        let (status, transition) = match &outcome {
            Ok(()) => {
                JOBS_TOTAL.with_label_values(&["completed"]).inc();
                log.info(format!("Post {} completed", index + 1));
                (PostStatus::Completed, queue.mark_completed(&post.id))
            }
            Err(e) => {
                JOBS_TOTAL.with_label_values(&["failed"]).inc();
                JOB_FAILURES.with_label_values(&[e.cause()]).inc();
                warn!(post_id = %post.id, "Post failed: {}", e);
                log.error(format!("Post {} failed: {}", index + 1, e));
                (PostStatus::Failed, queue.mark_failed(&post.id, &e.to_string()))
            }
        };
        drop(queue);

        if let Err(e) = transition {
            error!(post_id = %post.id, "Failed to record post status: {}", e);
            return None;
        }

        inner.relay.post_status(&post.id, status);
        Some(status)
    }

    async fn delay(inner: &Shared) {
        let secs = inner.settings_snapshot().post_delay_seconds;
        if secs == 0 {
            return;
        }

        // Register for the wakeup before checking the flag so a stop landing
        // in between is not missed.
        let notified = inner.wake.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if !inner.state().running {
            return;
        }

        debug!(secs, "Waiting before next post");
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(secs)) => {}
            _ = notified => {
                debug!("Delay interrupted by stop");
            }
        }
    }
}

/// Releases the loop lease if the loop task unwinds.
struct LoopGuard(Arc<Shared>);

impl Drop for LoopGuard {
    fn drop(&mut self) {
        if !std::thread::panicking() {
            return;
        }
        error!("Automation loop panicked, releasing lease");
        {
            let mut state = self.0.state();
            state.running = false;
            state.loop_active = false;
        }
        if let Ok(mut queue) = self.0.queue.try_write() {
            if let Some(id) = queue.processing().map(|p| p.id.clone()) {
                let _ = queue.mark_failed(&id, "automation loop panicked");
            }
        }
        self.0.relay.automation(false);
    }
}
