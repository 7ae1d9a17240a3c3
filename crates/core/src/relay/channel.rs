use tokio::sync::broadcast;

use super::{LogLevel, RelayMessage};
use crate::metrics::LOG_EVENTS;
use crate::post::PostStatus;

/// Fan-out of worker output and orchestrator events.
///
/// Delivery is best-effort: a send with no subscribers, or a subscriber that
/// lags, never affects the sender.
#[derive(Debug, Clone)]
pub struct LogRelay {
    sender: broadcast::Sender<RelayMessage>,
}

impl LogRelay {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn publish(&self, msg: RelayMessage) {
        // No subscribers is fine.
        let _ = self.sender.send(msg);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RelayMessage> {
        self.sender.subscribe()
    }

    /// Log sink tagged with a job's post index.
    pub fn for_job(&self, post_index: usize) -> JobLog {
        JobLog {
            relay: self.clone(),
            post_index,
        }
    }

    pub fn post_status(&self, post_id: &str, status: PostStatus) {
        self.publish(RelayMessage::PostStatus {
            post_id: post_id.to_string(),
            status,
        });
    }

    pub fn progress(&self, percent: f64, processed: usize, total: usize) {
        self.publish(RelayMessage::Progress {
            percent,
            processed,
            total,
        });
    }

    pub fn automation(&self, running: bool) {
        self.publish(RelayMessage::Automation { running });
    }

    pub fn finished(&self, completed: usize, failed: usize) {
        self.publish(RelayMessage::Finished { completed, failed });
    }
}

impl Default for LogRelay {
    fn default() -> Self {
        Self::new(256)
    }
}

/// Handle for emitting log lines on behalf of one job.
#[derive(Debug, Clone)]
pub struct JobLog {
    relay: LogRelay,
    post_index: usize,
}

impl JobLog {
    pub fn post_index(&self) -> usize {
        self.post_index
    }

    pub fn emit(&self, level: LogLevel, message: impl Into<String>) {
        LOG_EVENTS.with_label_values(&[level.as_str()]).inc();
        self.relay.publish(RelayMessage::Log {
            post_index: self.post_index,
            message: message.into(),
            level,
        });
    }

    pub fn info(&self, message: impl Into<String>) {
        self.emit(LogLevel::Info, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.emit(LogLevel::Error, message);
    }
}
