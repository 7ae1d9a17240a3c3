//! Post model and the ordered post queue.

mod filter;
mod queue;
mod snapshot;
mod types;

pub use filter::{PostFilter, SortOrder};
pub use queue::{ImportMode, PostError, PostQueue};
pub use types::*;

use std::sync::Arc;
use tokio::sync::RwLock;

/// Queue shared between the orchestrator and the API.
pub type SharedQueue = Arc<RwLock<PostQueue>>;
