//! Types for the worker supervisor.

use std::fmt;

use crate::settings::AutomationSettings;

/// Everything the worker needs for one job.
#[derive(Clone)]
pub struct WorkerJob {
    pub username: String,
    pub password: String,
    pub content: String,
    /// Absolute image paths or URLs.
    pub images: Vec<String>,
    /// Absolute video paths or URLs.
    pub videos: Vec<String>,
    pub settings: AutomationSettings,
}

impl WorkerJob {
    /// Arguments following the script path.
    ///
    /// `--username u --password p --content c [--images ...] [--videos ...]
    /// [--headless] [--speed s] [--manual-wait n]`
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "--username".to_string(),
            self.username.clone(),
            "--password".to_string(),
            self.password.clone(),
            "--content".to_string(),
            self.content.clone(),
        ];

        if !self.images.is_empty() {
            args.push("--images".to_string());
            args.extend(self.images.iter().cloned());
        }
        if !self.videos.is_empty() {
            args.push("--videos".to_string());
            args.extend(self.videos.iter().cloned());
        }
        if !self.settings.show_browser {
            args.push("--headless".to_string());
        }
        args.push("--speed".to_string());
        args.push(self.settings.speed.as_str().to_string());
        if self.settings.manual_wait_seconds > 0 {
            args.push("--manual-wait".to_string());
            args.push(self.settings.manual_wait_seconds.to_string());
        }

        args
    }
}

impl fmt::Debug for WorkerJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerJob")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("content_len", &self.content.len())
            .field("images", &self.images)
            .field("videos", &self.videos)
            .field("settings", &self.settings)
            .finish()
    }
}

/// Terminal outcome of one worker run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerResult {
    /// The process ran and exited. Signal termination reports `-1`.
    Exited {
        exit_code: i32,
        stdout: String,
        stderr: String,
    },
    /// The process could not be started.
    SpawnFailed { error: String },
    /// The process outlived the configured timeout and was killed.
    TimedOut {
        timeout_secs: u64,
        stdout: String,
        stderr: String,
    },
}

impl WorkerResult {
    pub fn is_success(&self) -> bool {
        matches!(self, WorkerResult::Exited { exit_code: 0, .. })
    }

    /// Captured standard output, if the process ran.
    pub fn stdout(&self) -> &str {
        match self {
            WorkerResult::Exited { stdout, .. } | WorkerResult::TimedOut { stdout, .. } => stdout,
            WorkerResult::SpawnFailed { .. } => "",
        }
    }

    /// Captured standard error, if the process ran.
    pub fn stderr(&self) -> &str {
        match self {
            WorkerResult::Exited { stderr, .. } | WorkerResult::TimedOut { stderr, .. } => stderr,
            WorkerResult::SpawnFailed { .. } => "",
        }
    }

    /// Human-readable failure reason; `None` on success.
    pub fn failure_reason(&self) -> Option<String> {
        match self {
            WorkerResult::Exited { exit_code: 0, .. } => None,
            WorkerResult::Exited { exit_code, .. } => {
                Some(format!("worker exited with code {}", exit_code))
            }
            WorkerResult::SpawnFailed { error } => {
                Some(format!("failed to start worker: {}", error))
            }
            WorkerResult::TimedOut { timeout_secs, .. } => {
                Some(format!("worker timed out after {} seconds", timeout_secs))
            }
        }
    }

    /// Label used in metrics.
    pub fn label(&self) -> &'static str {
        match self {
            WorkerResult::Exited { exit_code: 0, .. } => "success",
            WorkerResult::Exited { .. } => "exit",
            WorkerResult::SpawnFailed { .. } => "spawn",
            WorkerResult::TimedOut { .. } => "timeout",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Speed;

    fn job() -> WorkerJob {
        WorkerJob {
            username: "user".to_string(),
            password: "pw".to_string(),
            content: "hello".to_string(),
            images: vec![],
            videos: vec![],
            settings: AutomationSettings::default(),
        }
    }

    #[test]
    fn test_args_minimal() {
        assert_eq!(
            job().args(),
            vec![
                "--username", "user", "--password", "pw", "--content", "hello", "--speed",
                "normal"
            ]
        );
    }

    #[test]
    fn test_args_full() {
        let mut job = job();
        job.images = vec!["/tmp/a.jpg".to_string()];
        job.videos = vec!["https://youtu.be/x".to_string()];
        job.settings.show_browser = false;
        job.settings.speed = Speed::Fast;
        job.settings.manual_wait_seconds = 30;

        let args = job.args();
        let tail: Vec<&str> = args[6..].iter().map(String::as_str).collect();
        assert_eq!(
            tail,
            vec![
                "--images",
                "/tmp/a.jpg",
                "--videos",
                "https://youtu.be/x",
                "--headless",
                "--speed",
                "fast",
                "--manual-wait",
                "30"
            ]
        );
    }

    #[test]
    fn test_debug_redacts_password() {
        let mut job = job();
        job.password = "topsecret".to_string();
        assert!(!format!("{:?}", job).contains("topsecret"));
    }

    #[test]
    fn test_result_helpers() {
        let ok = WorkerResult::Exited {
            exit_code: 0,
            stdout: "done".to_string(),
            stderr: String::new(),
        };
        assert!(ok.is_success());
        assert!(ok.failure_reason().is_none());
        assert_eq!(ok.stdout(), "done");

        let failed = WorkerResult::Exited {
            exit_code: 1,
            stdout: String::new(),
            stderr: "login failed".to_string(),
        };
        assert!(!failed.is_success());
        assert_eq!(
            failed.failure_reason().unwrap(),
            "worker exited with code 1"
        );
        assert_eq!(failed.stderr(), "login failed");

        let spawn = WorkerResult::SpawnFailed {
            error: "not found".to_string(),
        };
        assert_eq!(spawn.label(), "spawn");
        assert!(spawn.failure_reason().unwrap().contains("not found"));
    }
}
