use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use tracing::{debug, info, warn};

use super::{CleanupHandle, CleanupReport, StagedMedia, StagingConfig, StagingError, StoredUpload};
use crate::metrics::{CLEANUP_FAILURES, STAGED_FILES};
use crate::post::{MediaKind, MediaRef, SourceKind};

/// `data:<mime>[;params];base64,`
static DATA_URL_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^data:([^;,]*)[^,]*;base64,").unwrap());

/// Turns media refs into locators the worker can open and owns the files it
/// writes along the way.
#[derive(Debug)]
pub struct MediaStagingManager {
    config: StagingConfig,
    seq: AtomicU64,
}

impl MediaStagingManager {
    pub fn new(config: StagingConfig) -> Self {
        Self {
            config,
            seq: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &StagingConfig {
        &self.config
    }

    /// Resolve `media` for one job.
    ///
    /// At most one image and one video are accepted; the limit is checked
    /// before anything is written. If a later item fails, files already
    /// written are removed when the partial handle drops.
    pub async fn stage(&self, media: &[MediaRef]) -> Result<StagedMedia, StagingError> {
        for kind in [MediaKind::Image, MediaKind::Video] {
            let count = media.iter().filter(|m| m.kind == kind).count();
            if count > 1 {
                return Err(StagingError::MediaLimitExceeded { kind, count });
            }
        }

        let mut staged = StagedMedia {
            images: Vec::new(),
            videos: Vec::new(),
            cleanup: CleanupHandle::default(),
        };

        for item in media {
            let locator = match item.source_kind {
                SourceKind::InlineEncoded => {
                    let path = self.write_inline(item).await?;
                    let locator = path.display().to_string();
                    staged.cleanup.push(path);
                    locator
                }
                SourceKind::StagedPath => {
                    let path = self.resolve_staged_path(&item.locator)?;
                    if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
                        return Err(StagingError::SourceMissing { path });
                    }
                    path.display().to_string()
                }
                SourceKind::RemoteUrl => item.locator.clone(),
            };

            match item.kind {
                MediaKind::Image => staged.images.push(locator),
                MediaKind::Video => staged.videos.push(locator),
            }
        }

        debug!(
            images = staged.images.len(),
            videos = staged.videos.len(),
            written = staged.cleanup.paths().len(),
            "Media staged"
        );
        Ok(staged)
    }

    /// Delete every file the handle owns. Never fails; problems are logged
    /// and counted in the report.
    pub async fn cleanup(&self, mut handle: CleanupHandle) -> CleanupReport {
        let mut report = CleanupReport::default();

        for path in handle.take() {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    debug!(path = %path.display(), "Removed staged file");
                    report.removed += 1;
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    warn!(path = %path.display(), "Staged file already removed");
                    report.missing += 1;
                }
                Err(e) => {
                    CLEANUP_FAILURES.inc();
                    warn!(path = %path.display(), error = %e, "Failed to remove staged file");
                    report.failed += 1;
                }
            }
        }

        report
    }

    /// Store an operator upload and return the locator to attach to posts.
    pub async fn store_upload(
        &self,
        kind: MediaKind,
        bytes: &[u8],
    ) -> Result<StoredUpload, StagingError> {
        if bytes.is_empty() {
            return Err(StagingError::EmptyUpload);
        }

        let dir = &self.config.uploads_dir;
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| StagingError::io(dir, e))?;

        let name = format!("{}.{}", uuid::Uuid::new_v4(), kind.default_extension());
        let path = absolute(&dir.join(&name))?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| StagingError::io(&path, e))?;

        info!(path = %path.display(), size = bytes.len(), kind = %kind, "Stored upload");
        Ok(StoredUpload {
            url: format!(
                "{}/{}",
                self.config.uploads_url_prefix.trim_end_matches('/'),
                name
            ),
            path,
        })
    }

    /// Map a staged-path locator to an absolute filesystem path.
    ///
    /// Locators under the uploads URL prefix resolve into the uploads
    /// directory; other relative paths resolve against the current directory.
    pub fn resolve_staged_path(&self, locator: &str) -> Result<PathBuf, StagingError> {
        let prefix = format!("{}/", self.config.uploads_url_prefix.trim_end_matches('/'));

        let path = match locator.strip_prefix(&prefix) {
            Some(rest) => {
                let rest = Path::new(rest);
                if rest
                    .components()
                    .any(|c| !matches!(c, Component::Normal(_)))
                {
                    return Err(StagingError::InvalidPath(locator.to_string()));
                }
                self.config.uploads_dir.join(rest)
            }
            None => PathBuf::from(locator),
        };

        absolute(&path)
    }

    async fn write_inline(&self, item: &MediaRef) -> Result<PathBuf, StagingError> {
        let (mime, payload) = split_data_url(&item.locator);
        let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| StagingError::InvalidInline {
                kind: item.kind,
                reason: e.to_string(),
            })?;
        if bytes.is_empty() {
            return Err(StagingError::InvalidInline {
                kind: item.kind,
                reason: "payload is empty".to_string(),
            });
        }

        let dir = &self.config.dir;
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| StagingError::io(dir, e))?;

        let ext = mime
            .and_then(extension_for_mime)
            .unwrap_or_else(|| item.kind.default_extension());
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let name = format!(
            "{}_{}_{}.{}",
            item.kind,
            Utc::now().timestamp_millis(),
            seq,
            ext
        );
        let path = absolute(&dir.join(name))?;

        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| StagingError::io(&path, e))?;
        STAGED_FILES.with_label_values(&[item.kind.as_str()]).inc();
        debug!(path = %path.display(), size = bytes.len(), "Wrote inline media");

        Ok(path)
    }
}

/// Split a data URL into its mime type and base64 payload. Input without a
/// `data:` header is treated as a bare payload.
fn split_data_url(locator: &str) -> (Option<&str>, &str) {
    match DATA_URL_PREFIX.captures(locator) {
        Some(caps) => {
            let end = caps.get(0).map_or(0, |m| m.end());
            let mime = caps.get(1).map(|m| m.as_str()).filter(|m| !m.is_empty());
            (mime, &locator[end..])
        }
        None => (None, locator),
    }
}

fn extension_for_mime(mime: &str) -> Option<&'static str> {
    match mime.to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "video/mp4" => Some("mp4"),
        "video/webm" => Some("webm"),
        "video/quicktime" => Some("mov"),
        _ => None,
    }
}

fn absolute(path: &Path) -> Result<PathBuf, StagingError> {
    std::path::absolute(path).map_err(|e| StagingError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PNG_1PX: &str = concat!(
        "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA",
        "60e6kgAAAABJRU5ErkJggg=="
    );

    fn manager(root: &TempDir) -> MediaStagingManager {
        MediaStagingManager::new(StagingConfig {
            dir: root.path().join("staging"),
            uploads_dir: root.path().join("uploads"),
            uploads_url_prefix: "/uploads".to_string(),
        })
    }

    fn staging_entries(root: &TempDir) -> usize {
        std::fs::read_dir(root.path().join("staging"))
            .map(|d| d.count())
            .unwrap_or(0)
    }

    #[test]
    fn test_split_data_url() {
        let (mime, payload) = split_data_url("data:image/png;base64,AAAA");
        assert_eq!(mime, Some("image/png"));
        assert_eq!(payload, "AAAA");

        let (mime, payload) = split_data_url("data:;charset=utf-8;base64,BBBB");
        assert_eq!(mime, None);
        assert_eq!(payload, "BBBB");

        let (mime, payload) = split_data_url("CCCC");
        assert_eq!(mime, None);
        assert_eq!(payload, "CCCC");
    }

    #[tokio::test]
    async fn test_stage_inline_writes_absolute_file() {
        let root = TempDir::new().unwrap();
        let manager = manager(&root);
        let media = vec![MediaRef::image(format!("data:image/png;base64,{}", PNG_1PX))];

        let staged = manager.stage(&media).await.unwrap();
        assert_eq!(staged.images.len(), 1);
        let path = PathBuf::from(&staged.images[0]);
        assert!(path.is_absolute());
        assert!(path.exists());
        assert_eq!(path.extension().unwrap(), "png");
        assert!(path
            .file_name()
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("image_"));

        let report = manager.cleanup(staged.cleanup).await;
        assert_eq!(report.removed, 1);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_second_image_rejected_before_any_write() {
        let root = TempDir::new().unwrap();
        let manager = manager(&root);
        let inline = format!("data:image/png;base64,{}", PNG_1PX);
        let media = vec![MediaRef::image(inline.clone()), MediaRef::image(inline)];

        let err = manager.stage(&media).await.unwrap_err();
        assert!(matches!(
            err,
            StagingError::MediaLimitExceeded {
                kind: MediaKind::Image,
                count: 2
            }
        ));
        assert_eq!(staging_entries(&root), 0);
    }

    #[tokio::test]
    async fn test_remote_url_passes_through() {
        let root = TempDir::new().unwrap();
        let manager = manager(&root);
        let staged = manager
            .stage(&[MediaRef::video("https://youtu.be/abc")])
            .await
            .unwrap();
        assert_eq!(staged.videos, vec!["https://youtu.be/abc".to_string()]);
        assert!(staged.cleanup.is_empty());
    }

    #[tokio::test]
    async fn test_uploads_resolve_and_are_not_cleaned() {
        let root = TempDir::new().unwrap();
        let manager = manager(&root);

        let upload = manager
            .store_upload(MediaKind::Image, b"not really a jpeg")
            .await
            .unwrap();
        assert!(upload.url.starts_with("/uploads/"));
        assert!(upload.url.ends_with(".jpg"));

        let staged = manager.stage(&[MediaRef::image(&upload.url)]).await.unwrap();
        assert_eq!(PathBuf::from(&staged.images[0]), upload.path);
        assert!(staged.cleanup.is_empty());

        manager.cleanup(staged.cleanup).await;
        assert!(upload.path.exists());
    }

    #[tokio::test]
    async fn test_missing_staged_path_fails() {
        let root = TempDir::new().unwrap();
        let manager = manager(&root);
        let err = manager
            .stage(&[MediaRef::image("/uploads/missing.jpg")])
            .await
            .unwrap_err();
        assert!(matches!(err, StagingError::SourceMissing { .. }));
    }

    #[test]
    fn test_upload_prefix_rejects_traversal() {
        let root = TempDir::new().unwrap();
        let manager = manager(&root);
        assert!(matches!(
            manager.resolve_staged_path("/uploads/../secret.txt"),
            Err(StagingError::InvalidPath(_))
        ));
        assert!(manager
            .resolve_staged_path("relative/file.jpg")
            .unwrap()
            .is_absolute());
    }

    #[tokio::test]
    async fn test_partial_failure_removes_written_files() {
        let root = TempDir::new().unwrap();
        let manager = manager(&root);
        let media = vec![
            MediaRef::image(format!("data:image/png;base64,{}", PNG_1PX)),
            MediaRef::video("/uploads/missing.mp4"),
        ];

        assert!(manager.stage(&media).await.is_err());
        assert_eq!(staging_entries(&root), 0);
    }

    #[tokio::test]
    async fn test_invalid_base64_rejected() {
        let root = TempDir::new().unwrap();
        let manager = manager(&root);
        let err = manager
            .stage(&[MediaRef::image("data:image/png;base64,!!!")])
            .await
            .unwrap_err();
        assert!(matches!(err, StagingError::InvalidInline { .. }));
    }

    #[tokio::test]
    async fn test_dropped_handle_removes_files() {
        let root = TempDir::new().unwrap();
        let manager = manager(&root);
        let staged = manager
            .stage(&[MediaRef::image(format!("data:image/png;base64,{}", PNG_1PX))])
            .await
            .unwrap();
        let path = PathBuf::from(&staged.images[0]);
        assert!(path.exists());

        drop(staged);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_cleanup_reports_missing_files() {
        let root = TempDir::new().unwrap();
        let manager = manager(&root);
        let staged = manager
            .stage(&[MediaRef::image(format!("data:image/png;base64,{}", PNG_1PX))])
            .await
            .unwrap();
        std::fs::remove_file(&staged.images[0]).unwrap();

        let report = manager.cleanup(staged.cleanup).await;
        assert_eq!(report.missing, 1);
        assert_eq!(report.removed, 0);
    }
}
