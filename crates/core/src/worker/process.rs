//! Worker implementation backed by an external process.

use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};

use super::config::WorkerConfig;
use super::traits::Worker;
use super::types::{WorkerJob, WorkerResult};
use crate::metrics::WORKER_DURATION;
use crate::relay::{JobLog, LogLevel};

/// Spawns the configured program once per job and streams its output.
#[derive(Debug, Clone)]
pub struct ProcessWorker {
    config: WorkerConfig,
}

impl ProcessWorker {
    pub fn new(config: WorkerConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(WorkerConfig::default())
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Full argument list: the script for the job's speed, then job arguments.
    pub fn build_args(&self, job: &WorkerJob) -> Vec<String> {
        let mut args = vec![self
            .config
            .script_for(job.settings.speed)
            .display()
            .to_string()];
        args.extend(job.args());
        args
    }
}

#[async_trait]
impl Worker for ProcessWorker {
    fn name(&self) -> &str {
        "process"
    }

    async fn run(&self, job: WorkerJob, log: JobLog) -> WorkerResult {
        let start = Instant::now();
        let args = self.build_args(&job);

        info!(
            program = %self.config.program,
            script = %args[0],
            post_index = log.post_index(),
            images = job.images.len(),
            videos = job.videos.len(),
            "Spawning worker"
        );

        let mut command = Command::new(&self.config.program);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.config.working_dir {
            command.current_dir(dir);
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                let error = if e.kind() == std::io::ErrorKind::NotFound {
                    format!("worker program not found: {}", self.config.program)
                } else {
                    e.to_string()
                };
                warn!(program = %self.config.program, error = %error, "Worker spawn failed");
                let result = WorkerResult::SpawnFailed { error };
                WORKER_DURATION
                    .with_label_values(&[result.label()])
                    .observe(start.elapsed().as_secs_f64());
                return result;
            }
        };

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            let _ = child.kill().await;
            return WorkerResult::SpawnFailed {
                error: "worker output streams were not captured".to_string(),
            };
        };

        let mut stdout_lines = BufReader::new(stdout).split(b'\n');
        let mut stderr_lines = BufReader::new(stderr).split(b'\n');
        let mut stdout_text = String::new();
        let mut stderr_text = String::new();

        let io = async {
            let mut stdout_open = true;
            let mut stderr_open = true;

            while stdout_open || stderr_open {
                tokio::select! {
                    segment = stdout_lines.next_segment(), if stdout_open => match segment {
                        Ok(Some(bytes)) => forward(&log, LogLevel::Info, &bytes, &mut stdout_text),
                        Ok(None) => stdout_open = false,
                        Err(e) => {
                            debug!("Worker stdout closed: {}", e);
                            stdout_open = false;
                        }
                    },
                    segment = stderr_lines.next_segment(), if stderr_open => match segment {
                        Ok(Some(bytes)) => forward(&log, LogLevel::Error, &bytes, &mut stderr_text),
                        Ok(None) => stderr_open = false,
                        Err(e) => {
                            debug!("Worker stderr closed: {}", e);
                            stderr_open = false;
                        }
                    },
                }
            }

            child.wait().await
        };

        let outcome = match self.config.timeout_secs {
            Some(secs) => timeout(Duration::from_secs(secs), io).await.ok(),
            None => Some(io.await),
        };

        let Some(waited) = outcome else {
            let timeout_secs = self.config.timeout_secs.unwrap_or_default();
            warn!(timeout_secs, "Worker timed out, killing process");
            let _ = child.kill().await;
            let result = WorkerResult::TimedOut {
                timeout_secs,
                stdout: stdout_text,
                stderr: stderr_text,
            };
            WORKER_DURATION
                .with_label_values(&[result.label()])
                .observe(start.elapsed().as_secs_f64());
            return result;
        };

        let exit_code = match waited {
            Ok(status) => status.code().unwrap_or(-1),
            Err(e) => {
                warn!("Failed to wait for worker: {}", e);
                -1
            }
        };

        let result = WorkerResult::Exited {
            exit_code,
            stdout: stdout_text,
            stderr: stderr_text,
        };
        WORKER_DURATION
            .with_label_values(&[result.label()])
            .observe(start.elapsed().as_secs_f64());
        info!(
            exit_code,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Worker exited"
        );
        result
    }
}

/// Relay one output line and keep it for the final result.
fn forward(log: &JobLog, level: LogLevel, bytes: &[u8], buffer: &mut String) {
    let line = String::from_utf8_lossy(bytes);
    let line = line.trim_end_matches('\r');

    buffer.push_str(line);
    buffer.push('\n');

    let trimmed = line.trim();
    if !trimmed.is_empty() {
        log.emit(level, trimmed);
    }
}
