//! Live relay of worker output and orchestrator events.
//!
//! Subscribers (the WebSocket endpoint, the daily log file writer) each get
//! their own broadcast receiver; events for one job arrive in emission order.

mod channel;
mod file;
mod types;

pub use channel::{JobLog, LogRelay};
pub use file::{log_file_path, read_recent, LogFileWriter};
pub use types::{LogLevel, RelayMessage};
