use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use tokio::io::AsyncWriteExt;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use super::{LogRelay, RelayMessage};

/// Background task that appends relayed events to a daily log file
/// (`automation_YYYY-MM-DD.log`).
pub struct LogFileWriter {
    rx: broadcast::Receiver<RelayMessage>,
    dir: PathBuf,
}

impl LogFileWriter {
    /// Subscribe to `relay`. Events published before this call are not written.
    pub fn new(relay: &LogRelay, dir: impl Into<PathBuf>) -> Self {
        Self {
            rx: relay.subscribe(),
            dir: dir.into(),
        }
    }

    /// Run the writer until every relay handle is dropped.
    ///
    /// This should be spawned as a background task.
    pub async fn run(mut self) {
        info!(dir = %self.dir.display(), "Log file writer started");

        loop {
            match self.rx.recv().await {
                Ok(msg) => {
                    let now = Utc::now();
                    let Some(line) = format_line(&msg, now) else {
                        continue;
                    };
                    if let Err(e) = append_line(&self.dir, now, &line).await {
                        error!("Failed to write automation log: {}", e);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Log file writer lagged, skipped {} events", n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }

        info!("Log file writer shutting down");
    }
}

/// Path of the log file for `date`.
pub fn log_file_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("automation_{}.log", date.format("%Y-%m-%d")))
}

/// Last `limit` lines of today's log file. A missing file yields no lines.
pub async fn read_recent(dir: &Path, limit: usize) -> std::io::Result<Vec<String>> {
    let path = log_file_path(dir, Utc::now().date_naive());
    let raw = match tokio::fs::read_to_string(&path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let lines: Vec<&str> = raw.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(limit);
    Ok(lines[start..].iter().map(|l| l.to_string()).collect())
}

fn format_line(msg: &RelayMessage, now: DateTime<Utc>) -> Option<String> {
    let ts = now.to_rfc3339_opts(SecondsFormat::Millis, true);
    match msg {
        RelayMessage::Log {
            post_index,
            message,
            level,
        } => Some(format!(
            "[{}] [{}] [post {}] {}",
            ts,
            level.as_str().to_uppercase(),
            post_index,
            message
        )),
        RelayMessage::PostStatus { post_id, status } => {
            Some(format!("[{}] [STATUS] post {} -> {}", ts, post_id, status))
        }
        RelayMessage::Automation { running } => Some(format!(
            "[{}] [AUTOMATION] {}",
            ts,
            if *running { "started" } else { "stopped" }
        )),
        RelayMessage::Finished { completed, failed } => Some(format!(
            "[{}] [FINISHED] {} completed, {} failed",
            ts, completed, failed
        )),
        RelayMessage::Progress { .. } => None,
    }
}

async fn append_line(dir: &Path, now: DateTime<Utc>, line: &str) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path(dir, now.date_naive()))
        .await?;
    file.write_all(line.as_bytes()).await?;
    file.write_all(b"\n").await?;
    file.flush().await
}
