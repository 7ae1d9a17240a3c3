//! Operator automation settings.
//!
//! Settings are read fresh for each job, so a change applies from the next
//! job onward.

mod store;
mod types;

pub use store::{InMemorySettingsStore, JsonFileSettingsStore, SettingsError, SettingsStore};
pub use types::{AutomationSettings, Speed};
