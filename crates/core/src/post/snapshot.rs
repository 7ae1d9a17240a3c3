//! JSON snapshot of the post queue.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use super::{Post, PostError};

pub(crate) fn load(path: &Path) -> Result<Vec<Post>, PostError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(PostError::Snapshot(format!(
                "failed to read {}: {}",
                path.display(),
                e
            )))
        }
    };

    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    serde_json::from_str(&raw)
        .map_err(|e| PostError::Snapshot(format!("failed to parse {}: {}", path.display(), e)))
}

/// Write via a sibling temp file so a crash never leaves a truncated snapshot.
pub(crate) fn save(path: &Path, posts: &[Post]) -> Result<(), PostError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| PostError::Snapshot(e.to_string()))?;
        }
    }

    let json =
        serde_json::to_string_pretty(posts).map_err(|e| PostError::Snapshot(e.to_string()))?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(|e| PostError::Snapshot(e.to_string()))?;
    fs::rename(&tmp, path).map_err(|e| PostError::Snapshot(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_and_empty_files_load_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("posts.json");
        assert!(load(&path).unwrap().is_empty());

        fs::write(&path, "  \n").unwrap();
        assert!(load(&path).unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("posts.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(load(&path), Err(PostError::Snapshot(_))));
    }
}
