//! Media staging: turns post media into worker-consumable locators and
//! removes the temporary files afterwards.

mod config;
mod error;
mod manager;
mod types;

pub use config::StagingConfig;
pub use error::StagingError;
pub use manager::MediaStagingManager;
pub use types::{CleanupHandle, CleanupReport, StagedMedia, StoredUpload};
