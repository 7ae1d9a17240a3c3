//! Read-only account directory.
//!
//! Posts reference accounts by id; the orchestrator resolves the reference
//! once per job and never mutates accounts.

mod directory;
mod types;

pub use directory::{AccountDirectory, AccountError, FileAccountDirectory, InMemoryAccountDirectory};
pub use types::Account;
