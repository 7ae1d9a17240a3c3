//! The ordered post queue and its status state machine.

use std::collections::HashSet;
use std::path::PathBuf;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::snapshot;
use super::{CreatePostRequest, Post, PostFilter, PostStatus, StatusCounts, UpdatePostRequest};

/// Error type for post queue operations.
#[derive(Debug, Error)]
pub enum PostError {
    #[error("invalid post: {0}")]
    Validation(String),

    #[error("post not found: {0}")]
    NotFound(String),

    #[error("cannot {operation} post {post_id}: status is {status}")]
    Locked {
        post_id: String,
        status: PostStatus,
        operation: &'static str,
    },

    #[error("invalid transition for post {post_id}: {from} -> {to}")]
    InvalidTransition {
        post_id: String,
        from: PostStatus,
        to: PostStatus,
    },

    #[error("cannot start post {requested}: post {active} is already processing")]
    SingleFlightViolation { requested: String, active: String },

    #[error("snapshot error: {0}")]
    Snapshot(String),
}

/// How imported posts are merged into the queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportMode {
    /// Discard the current queue.
    #[default]
    Replace,
    /// Keep the current queue; posts with an existing id are skipped.
    Append,
}

/// Ordered collection of posts, kept in creation order.
///
/// Only the orchestrator moves posts through `processing`; operator edits go
/// through [`PostQueue::update`] and [`PostQueue::delete`], which refuse
/// posts that are processing or completed.
#[derive(Debug, Default)]
pub struct PostQueue {
    posts: Vec<Post>,
    snapshot_path: Option<PathBuf>,
}

impl PostQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a queue from existing posts.
    ///
    /// Posts left `processing` by an interrupted run are marked `failed`.
    pub fn from_posts(mut posts: Vec<Post>) -> Self {
        for post in posts.iter_mut() {
            if post.status == PostStatus::Processing {
                warn!(post_id = %post.id, "Recovering post left processing by a previous run");
                post.status = PostStatus::Failed;
                post.last_error = Some("interrupted".to_string());
            }
        }
        posts.sort_by_key(|p| p.created_at);
        Self {
            posts,
            snapshot_path: None,
        }
    }

    /// Load the queue from a JSON snapshot and keep writing changes back to it.
    /// A missing file yields an empty queue.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PostError> {
        let path = path.into();
        let posts = snapshot::load(&path)?;
        let mut queue = Self::from_posts(posts);
        queue.snapshot_path = Some(path);
        Ok(queue)
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// All posts in creation order.
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn get(&self, id: &str) -> Option<&Post> {
        self.posts.iter().find(|p| p.id == id)
    }

    /// Position of a post in creation order.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.posts.iter().position(|p| p.id == id)
    }

    pub fn list(&self, filter: &PostFilter) -> Vec<Post> {
        let mut posts: Vec<Post> = self
            .posts
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        filter.sort(&mut posts);
        posts
    }

    pub fn counts(&self) -> StatusCounts {
        let mut counts = StatusCounts {
            total: self.posts.len(),
            ..Default::default()
        };
        for post in &self.posts {
            match post.status {
                PostStatus::Pending => counts.pending += 1,
                PostStatus::Processing => counts.processing += 1,
                PostStatus::Completed => counts.completed += 1,
                PostStatus::Failed => counts.failed += 1,
            }
        }
        counts
    }

    /// Append a new pending post.
    pub fn add(&mut self, request: CreatePostRequest) -> Result<Post, PostError> {
        validate(&request.content, &request.account_ref)?;

        let mut now = Utc::now();
        // Keep creation timestamps monotonic so ordering matches insertion.
        if let Some(last) = self.posts.last() {
            if now < last.created_at {
                now = last.created_at;
            }
        }

        let post = Post {
            id: uuid::Uuid::new_v4().to_string(),
            content: request.content,
            account_ref: request.account_ref,
            media: request.media,
            status: PostStatus::Pending,
            last_error: None,
            created_at: now,
            updated_at: now,
        };
        debug!(post_id = %post.id, "Post added");
        self.posts.push(post.clone());
        self.persist();
        Ok(post)
    }

    /// Edit a pending or failed post.
    pub fn update(&mut self, id: &str, request: UpdatePostRequest) -> Result<Post, PostError> {
        let post = self.editable_mut(id, "edit")?;

        let content = request.content.as_deref().unwrap_or(&post.content);
        let account_ref = request.account_ref.as_deref().unwrap_or(&post.account_ref);
        validate(content, account_ref)?;

        if let Some(content) = request.content {
            post.content = content;
        }
        if let Some(account_ref) = request.account_ref {
            post.account_ref = account_ref;
        }
        if let Some(media) = request.media {
            post.media = media;
        }
        post.updated_at = Utc::now();

        let post = post.clone();
        self.persist();
        Ok(post)
    }

    /// Remove a pending or failed post.
    pub fn delete(&mut self, id: &str) -> Result<Post, PostError> {
        self.editable_mut(id, "delete")?;
        let index = self
            .position(id)
            .ok_or_else(|| PostError::NotFound(id.to_string()))?;
        let post = self.posts.remove(index);
        self.persist();
        Ok(post)
    }

    /// First `pending` or `failed` post in creation order.
    pub fn next_eligible(&self) -> Option<&Post> {
        self.posts.iter().find(|p| p.status.is_eligible())
    }

    /// First eligible post whose id is not in `attempted`.
    pub fn next_eligible_excluding(&self, attempted: &HashSet<String>) -> Option<&Post> {
        self.posts
            .iter()
            .find(|p| p.status.is_eligible() && !attempted.contains(&p.id))
    }

    pub fn eligible_count(&self) -> usize {
        self.posts.iter().filter(|p| p.status.is_eligible()).count()
    }

    /// The post currently processing, if any.
    pub fn processing(&self) -> Option<&Post> {
        self.posts
            .iter()
            .find(|p| p.status == PostStatus::Processing)
    }

    pub(crate) fn mark_processing(&mut self, id: &str) -> Result<Post, PostError> {
        if let Some(active) = self.processing() {
            if active.id != id {
                return Err(PostError::SingleFlightViolation {
                    requested: id.to_string(),
                    active: active.id.clone(),
                });
            }
        }
        self.transition(id, PostStatus::Processing, None)
    }

    pub(crate) fn mark_completed(&mut self, id: &str) -> Result<Post, PostError> {
        self.transition(id, PostStatus::Completed, None)
    }

    pub(crate) fn mark_failed(&mut self, id: &str, reason: &str) -> Result<Post, PostError> {
        self.transition(id, PostStatus::Failed, Some(reason.to_string()))
    }

    /// Return posts to `pending`. With `keep_completed`, completed posts are
    /// left alone. Returns the number of posts changed.
    pub(crate) fn reset_statuses(&mut self, keep_completed: bool) -> usize {
        let now = Utc::now();
        let mut changed = 0;
        for post in self.posts.iter_mut() {
            let reset = match post.status {
                PostStatus::Pending => false,
                PostStatus::Completed => !keep_completed,
                PostStatus::Processing | PostStatus::Failed => true,
            };
            if reset {
                post.status = PostStatus::Pending;
                post.last_error = None;
                post.updated_at = now;
                changed += 1;
            }
        }
        if changed > 0 {
            self.persist();
        }
        changed
    }

    /// Import posts. Ids and statuses are kept, except that `processing`
    /// is recovered to `failed`. Returns the number of posts added.
    pub fn import(&mut self, posts: Vec<Post>, mode: ImportMode) -> Result<usize, PostError> {
        if self.processing().is_some() {
            return Err(PostError::Validation(
                "cannot import while a post is processing".to_string(),
            ));
        }
        for post in &posts {
            validate(&post.content, &post.account_ref)?;
        }

        let incoming = Self::from_posts(posts).posts;
        let added = match mode {
            ImportMode::Replace => {
                let added = incoming.len();
                self.posts = incoming;
                added
            }
            ImportMode::Append => {
                let existing: HashSet<String> = self.posts.iter().map(|p| p.id.clone()).collect();
                let before = self.posts.len();
                self.posts
                    .extend(incoming.into_iter().filter(|p| !existing.contains(&p.id)));
                self.posts.sort_by_key(|p| p.created_at);
                self.posts.len() - before
            }
        };

        self.persist();
        Ok(added)
    }

    /// Copy of every post, for export.
    pub fn export(&self) -> Vec<Post> {
        self.posts.clone()
    }

    fn editable_mut(&mut self, id: &str, operation: &'static str) -> Result<&mut Post, PostError> {
        let post = self
            .posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| PostError::NotFound(id.to_string()))?;
        if !post.status.is_editable() {
            return Err(PostError::Locked {
                post_id: id.to_string(),
                status: post.status,
                operation,
            });
        }
        Ok(post)
    }

    fn transition(
        &mut self,
        id: &str,
        to: PostStatus,
        last_error: Option<String>,
    ) -> Result<Post, PostError> {
        let post = self
            .posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| PostError::NotFound(id.to_string()))?;

        let allowed = match (post.status, to) {
            (PostStatus::Pending | PostStatus::Failed, PostStatus::Processing) => true,
            (PostStatus::Processing, PostStatus::Completed | PostStatus::Failed) => true,
            _ => false,
        };
        if !allowed {
            return Err(PostError::InvalidTransition {
                post_id: id.to_string(),
                from: post.status,
                to,
            });
        }

        post.status = to;
        post.updated_at = Utc::now();
        match to {
            PostStatus::Failed => post.last_error = last_error,
            PostStatus::Completed => post.last_error = None,
            _ => {}
        }
        let post = post.clone();
        self.persist();
        Ok(post)
    }

    fn persist(&self) {
        if let Some(path) = &self.snapshot_path {
            if let Err(e) = snapshot::save(path, &self.posts) {
                warn!(path = %path.display(), error = %e, "Failed to write post snapshot");
            }
        }
    }
}

fn validate(content: &str, account_ref: &str) -> Result<(), PostError> {
    if content.trim().is_empty() {
        return Err(PostError::Validation("content cannot be empty".to_string()));
    }
    if account_ref.trim().is_empty() {
        return Err(PostError::Validation(
            "account reference cannot be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::post::{MediaRef, SortOrder};
    use tempfile::TempDir;

    fn request(content: &str, account: &str) -> CreatePostRequest {
        CreatePostRequest {
            content: content.to_string(),
            account_ref: account.to_string(),
            media: vec![],
        }
    }

    fn queue_with(n: usize) -> (PostQueue, Vec<String>) {
        let mut queue = PostQueue::new();
        let ids = (0..n)
            .map(|i| queue.add(request(&format!("post {}", i), "acc1")).unwrap().id)
            .collect();
        (queue, ids)
    }

    #[test]
    fn test_add_is_pending_in_creation_order() {
        let (queue, ids) = queue_with(3);
        assert_eq!(queue.len(), 3);
        let order: Vec<&str> = queue.posts().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(order, ids.iter().map(String::as_str).collect::<Vec<_>>());
        assert!(queue.posts().iter().all(|p| p.status == PostStatus::Pending));
        assert_eq!(queue.position(&ids[2]), Some(2));
    }

    #[test]
    fn test_add_rejects_empty_fields() {
        let mut queue = PostQueue::new();
        assert!(matches!(
            queue.add(request("   ", "acc1")),
            Err(PostError::Validation(_))
        ));
        assert!(matches!(
            queue.add(request("hello", "")),
            Err(PostError::Validation(_))
        ));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_next_eligible_skips_completed_and_processing() {
        let (mut queue, ids) = queue_with(3);
        queue.mark_processing(&ids[0]).unwrap();
        queue.mark_completed(&ids[0]).unwrap();
        queue.mark_processing(&ids[1]).unwrap();

        assert_eq!(queue.next_eligible().unwrap().id, ids[2]);
        assert_eq!(queue.eligible_count(), 1);
    }

    #[test]
    fn test_failed_posts_are_eligible_again() {
        let (mut queue, ids) = queue_with(2);
        queue.mark_processing(&ids[0]).unwrap();
        queue.mark_failed(&ids[0], "exit code 1").unwrap();

        assert_eq!(queue.next_eligible().unwrap().id, ids[0]);
        assert_eq!(
            queue.get(&ids[0]).unwrap().last_error.as_deref(),
            Some("exit code 1")
        );

        let attempted: HashSet<String> = [ids[0].clone()].into_iter().collect();
        assert_eq!(queue.next_eligible_excluding(&attempted).unwrap().id, ids[1]);
    }

    #[test]
    fn test_single_flight_violation() {
        let (mut queue, ids) = queue_with(2);
        queue.mark_processing(&ids[0]).unwrap();
        let err = queue.mark_processing(&ids[1]).unwrap_err();
        assert!(matches!(err, PostError::SingleFlightViolation { .. }));
        assert_eq!(queue.counts().processing, 1);
    }

    #[test]
    fn test_invalid_transitions() {
        let (mut queue, ids) = queue_with(1);
        assert!(matches!(
            queue.mark_completed(&ids[0]),
            Err(PostError::InvalidTransition { .. })
        ));

        queue.mark_processing(&ids[0]).unwrap();
        queue.mark_completed(&ids[0]).unwrap();
        assert!(matches!(
            queue.mark_processing(&ids[0]),
            Err(PostError::InvalidTransition { .. })
        ));
        assert!(matches!(
            queue.mark_failed(&ids[0], "late"),
            Err(PostError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_edit_and_delete_guards() {
        let (mut queue, ids) = queue_with(3);
        queue.mark_processing(&ids[0]).unwrap();
        queue.mark_completed(&ids[0]).unwrap();
        queue.mark_processing(&ids[1]).unwrap();

        for id in &ids[..2] {
            assert!(matches!(
                queue.update(
                    id,
                    UpdatePostRequest {
                        content: Some("changed".to_string()),
                        ..Default::default()
                    }
                ),
                Err(PostError::Locked { .. })
            ));
            assert!(matches!(queue.delete(id), Err(PostError::Locked { .. })));
        }

        let updated = queue
            .update(
                &ids[2],
                UpdatePostRequest {
                    content: Some("changed".to_string()),
                    media: Some(vec![MediaRef::image("/uploads/a.jpg")]),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.content, "changed");
        assert_eq!(updated.media.len(), 1);

        queue.delete(&ids[2]).unwrap();
        assert_eq!(queue.len(), 2);
        assert!(matches!(queue.delete("missing"), Err(PostError::NotFound(_))));
    }

    #[test]
    fn test_reset_statuses() {
        let (mut queue, ids) = queue_with(3);
        queue.mark_processing(&ids[0]).unwrap();
        queue.mark_completed(&ids[0]).unwrap();
        queue.mark_processing(&ids[1]).unwrap();
        queue.mark_failed(&ids[1], "boom").unwrap();

        assert_eq!(queue.reset_statuses(true), 1);
        assert_eq!(queue.get(&ids[0]).unwrap().status, PostStatus::Completed);
        assert_eq!(queue.get(&ids[1]).unwrap().status, PostStatus::Pending);
        assert!(queue.get(&ids[1]).unwrap().last_error.is_none());

        assert_eq!(queue.reset_statuses(false), 1);
        assert_eq!(queue.counts().pending, 3);
    }

    #[test]
    fn test_list_filters_and_sorts() {
        let mut queue = PostQueue::new();
        let a = queue.add(request("Hello world", "alice")).unwrap();
        let b = queue.add(request("Second", "bob")).unwrap();
        queue.mark_processing(&a.id).unwrap();
        queue.mark_completed(&a.id).unwrap();

        let pending = queue.list(&PostFilter::new().with_status(PostStatus::Pending));
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, b.id);

        let search = queue.list(&PostFilter::new().with_search("HELLO"));
        assert_eq!(search.len(), 1);
        assert_eq!(search[0].id, a.id);

        let by_account = queue.list(&PostFilter::new().with_search("bob"));
        assert_eq!(by_account[0].id, b.id);

        let newest = queue.list(&PostFilter::new().with_sort(SortOrder::Newest));
        assert_eq!(newest[0].id, b.id);

        let by_status = queue.list(&PostFilter::new().with_sort(SortOrder::Status));
        assert_eq!(by_status[0].id, b.id);

        let today = Utc::now().date_naive();
        let tomorrow = today.succ_opt().unwrap();
        assert_eq!(
            queue
                .list(&PostFilter::new().with_date_range(Some(today), Some(today)))
                .len(),
            2
        );
        assert!(queue
            .list(&PostFilter::new().with_date_range(Some(tomorrow), None))
            .is_empty());
    }

    #[test]
    fn test_import_append_and_replace() {
        let (mut queue, _) = queue_with(2);
        let (other, _) = queue_with(1);
        let mut exported = other.export();
        exported[0].status = PostStatus::Processing;

        let added = queue.import(exported.clone(), ImportMode::Append).unwrap();
        assert_eq!(added, 1);
        assert_eq!(queue.len(), 3);
        assert_eq!(
            queue.get(&exported[0].id).unwrap().status,
            PostStatus::Failed
        );

        // Same ids again: nothing new.
        assert_eq!(queue.import(exported.clone(), ImportMode::Append).unwrap(), 0);

        assert_eq!(queue.import(exported, ImportMode::Replace).unwrap(), 1);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_snapshot_persists_changes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("posts.json");

        let id = {
            let mut queue = PostQueue::open(&path).unwrap();
            let post = queue.add(request("persisted", "acc1")).unwrap();
            queue.mark_processing(&post.id).unwrap();
            post.id
        };

        let queue = PostQueue::open(&path).unwrap();
        let post = queue.get(&id).unwrap();
        assert_eq!(post.content, "persisted");
        assert_eq!(post.status, PostStatus::Failed);
        assert_eq!(post.last_error.as_deref(), Some("interrupted"));
    }
}
