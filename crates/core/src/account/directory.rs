use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use super::Account;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("failed to read accounts from {path}: {reason}")]
    Read { path: PathBuf, reason: String },
}

/// Lookup of accounts by reference.
pub trait AccountDirectory: Send + Sync {
    /// Account whose id equals `account_ref`, if any.
    fn resolve(&self, account_ref: &str) -> Result<Option<Account>, AccountError>;

    fn list(&self) -> Result<Vec<Account>, AccountError>;
}

/// Accounts from a comma-separated text file, re-read on every lookup so
/// edits made by other tools are picked up without a restart.
#[derive(Debug, Clone)]
pub struct FileAccountDirectory {
    path: PathBuf,
}

impl FileAccountDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Vec<Account>, AccountError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Accounts file not found");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(AccountError::Read {
                    path: self.path.clone(),
                    reason: e.to_string(),
                })
            }
        };

        let mut accounts = Vec::new();
        for (number, line) in raw.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match Account::from_line(line) {
                Some(account) => accounts.push(account),
                None => warn!(
                    path = %self.path.display(),
                    line = number + 1,
                    "Skipping malformed account line"
                ),
            }
        }
        Ok(accounts)
    }
}

impl AccountDirectory for FileAccountDirectory {
    fn resolve(&self, account_ref: &str) -> Result<Option<Account>, AccountError> {
        Ok(self.read_all()?.into_iter().find(|a| a.id == account_ref))
    }

    fn list(&self) -> Result<Vec<Account>, AccountError> {
        self.read_all()
    }
}

/// Fixed set of accounts.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAccountDirectory {
    accounts: Vec<Account>,
}

impl InMemoryAccountDirectory {
    pub fn new(accounts: Vec<Account>) -> Self {
        Self { accounts }
    }
}

impl AccountDirectory for InMemoryAccountDirectory {
    fn resolve(&self, account_ref: &str) -> Result<Option<Account>, AccountError> {
        Ok(self.accounts.iter().find(|a| a.id == account_ref).cloned())
    }

    fn list(&self) -> Result<Vec<Account>, AccountError> {
        Ok(self.accounts.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_directory_resolves_by_id() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("accounts.txt");
        fs::write(
            &path,
            "a1,One,one@example.com,pw1,,,,\n\nbroken line\na2,Two,two@example.com,pw2\n",
        )
        .unwrap();

        let accounts = FileAccountDirectory::new(&path);
        assert_eq!(accounts.list().unwrap().len(), 2);
        assert_eq!(
            accounts.resolve("a2").unwrap().unwrap().username,
            "two@example.com"
        );
        assert!(accounts.resolve("missing").unwrap().is_none());
    }

    #[test]
    fn test_file_directory_rereads_on_change() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("accounts.txt");
        let accounts = FileAccountDirectory::new(&path);
        assert!(accounts.list().unwrap().is_empty());

        fs::write(&path, "a1,One,one,pw\n").unwrap();
        assert!(accounts.resolve("a1").unwrap().is_some());
    }

    #[test]
    fn test_in_memory_directory() {
        let accounts = InMemoryAccountDirectory::new(vec![Account::new("acc1", "user", "pw")]);
        assert_eq!(accounts.resolve("acc1").unwrap().unwrap().password, "pw");
        assert!(accounts.resolve("acc2").unwrap().is_none());
    }
}
