//! Testing utilities and mock implementations.
//!
//! This module provides a mock worker plus fixtures for building an
//! orchestrator without spawning real processes.
//!
//! # Example
//!
//! ```rust,ignore
//! use postflow_core::testing::{fixtures, MockWorker};
//!
//! let worker = Arc::new(MockWorker::new());
//! let temp = TempDir::new()?;
//! let accounts = vec![fixtures::account("acc-1")];
//! let harness = fixtures::Harness::new(temp.path(), worker.clone(), accounts);
//!
//! harness.add_post("hello", "acc-1").await;
//! harness.orchestrator.start().await?;
//! ```

mod mock_worker;

pub use mock_worker::{MockWorker, RecordedJob};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::sync::RwLock;

    use crate::account::{Account, InMemoryAccountDirectory};
    use crate::orchestrator::{AutomationOrchestrator, OrchestratorConfig};
    use crate::post::{CreatePostRequest, MediaRef, Post, PostQueue, SharedQueue};
    use crate::relay::LogRelay;
    use crate::settings::{AutomationSettings, InMemorySettingsStore};
    use crate::staging::{MediaStagingManager, StagingConfig};
    use crate::worker::Worker;

    /// Create a test account whose username and password derive from `id`.
    pub fn account(id: &str) -> Account {
        Account::new(id, &format!("user-{}", id), &format!("pass-{}", id))
    }

    /// Settings with no delay between jobs.
    pub fn fast_settings() -> AutomationSettings {
        AutomationSettings {
            show_browser: false,
            post_delay_seconds: 0,
            ..AutomationSettings::default()
        }
    }

    /// A create request without media.
    pub fn post_request(content: &str, account_ref: &str) -> CreatePostRequest {
        CreatePostRequest {
            content: content.to_string(),
            account_ref: account_ref.to_string(),
            media: Vec::new(),
        }
    }

    /// A create request with media.
    pub fn post_request_with_media(
        content: &str,
        account_ref: &str,
        media: Vec<MediaRef>,
    ) -> CreatePostRequest {
        CreatePostRequest {
            media,
            ..post_request(content, account_ref)
        }
    }

    /// A tiny inline JPEG-ish payload.
    pub fn inline_image() -> MediaRef {
        MediaRef::image("data:image/jpeg;base64,/9j/4AAQSkZJRg==")
    }

    /// Everything an orchestrator needs, wired to in-memory stores. Staged
    /// and uploaded files live under `root`.
    pub struct Harness {
        pub orchestrator: AutomationOrchestrator,
        pub queue: SharedQueue,
        pub relay: LogRelay,
        pub staging: Arc<MediaStagingManager>,
        pub settings: Arc<InMemorySettingsStore>,
    }

    impl Harness {
        pub fn new(root: &Path, worker: Arc<dyn Worker>, accounts: Vec<Account>) -> Self {
            Self::with_settings(root, worker, accounts, fast_settings())
        }

        pub fn with_settings(
            root: &Path,
            worker: Arc<dyn Worker>,
            accounts: Vec<Account>,
            settings: AutomationSettings,
        ) -> Self {
            let staging = Arc::new(MediaStagingManager::new(StagingConfig {
                dir: root.join("staging"),
                uploads_dir: root.join("uploads"),
                ..StagingConfig::default()
            }));
            let queue: SharedQueue = Arc::new(RwLock::new(PostQueue::new()));
            let relay = LogRelay::new(1024);
            let settings = Arc::new(InMemorySettingsStore::new(settings));

            let orchestrator = AutomationOrchestrator::new(
                OrchestratorConfig {
                    default_post_delay_secs: 0,
                    ..OrchestratorConfig::default()
                },
                Arc::clone(&queue),
                Arc::new(InMemoryAccountDirectory::new(accounts)),
                settings.clone(),
                Arc::clone(&staging),
                worker,
                relay.clone(),
            );

            Self {
                orchestrator,
                queue,
                relay,
                staging,
                settings,
            }
        }

        pub async fn add_post(&self, content: &str, account_ref: &str) -> Post {
            self.queue
                .write()
                .await
                .add(post_request(content, account_ref))
                .expect("add post")
        }

        pub async fn post(&self, id: &str) -> Post {
            self.queue.read().await.get(id).cloned().expect("post exists")
        }

        /// Wait until the loop has fully exited or `timeout` elapses.
        pub async fn wait_idle(&self, timeout: Duration) -> bool {
            let deadline = tokio::time::Instant::now() + timeout;
            while tokio::time::Instant::now() < deadline {
                let status = self.orchestrator.status().await;
                if !status.running && !status.draining {
                    return true;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            false
        }
    }
}
