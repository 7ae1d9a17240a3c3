//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with a mock worker injected, so no real automation process is spawned.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tokio::sync::RwLock;
use tower::ServiceExt;

use postflow_core::{
    testing::MockWorker, Account, AutomationOrchestrator, Config, InMemoryAccountDirectory,
    JsonFileSettingsStore, LoggingConfig, MediaStagingManager, OrchestratorConfig, PostQueue,
    SettingsStore, SharedQueue, StagingConfig, Worker,
};

/// Re-export fixtures for test convenience
pub use postflow_core::testing::fixtures;

/// Test fixture for API testing with a mock worker.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_post_creation() {
///     let fixture = TestFixture::new().await;
///
///     let response = fixture.post("/api/v1/posts", json!({
///         "content": "hello",
///         "accountRef": "acc-1"
///     })).await;
///
///     assert_eq!(response.status, 201);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock worker - script results, hold jobs open
    pub worker: Arc<MockWorker>,
    pub orchestrator: AutomationOrchestrator,
    pub queue: SharedQueue,
    pub config: Config,
    /// Temporary directory for settings, logs, staging, and uploads
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with two accounts, `acc-1` and `acc-2`.
    pub async fn new() -> Self {
        Self::with_accounts(vec![fixtures::account("acc-1"), fixtures::account("acc-2")]).await
    }

    pub async fn with_accounts(accounts: Vec<Account>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path();

        let config = Config {
            staging: StagingConfig {
                dir: root.join("staging"),
                uploads_dir: root.join("uploads"),
                ..StagingConfig::default()
            },
            logging: LoggingConfig {
                dir: root.join("logs"),
                ..LoggingConfig::default()
            },
            orchestrator: OrchestratorConfig {
                default_post_delay_secs: 0,
                ..OrchestratorConfig::default()
            },
            ..Config::default()
        };

        let worker = Arc::new(MockWorker::new());
        let queue: SharedQueue = Arc::new(RwLock::new(PostQueue::new()));
        let accounts = Arc::new(InMemoryAccountDirectory::new(accounts));
        let settings: Arc<dyn SettingsStore> =
            Arc::new(JsonFileSettingsStore::new(root.join("settings.json")));
        settings
            .save(&fixtures::fast_settings())
            .expect("Failed to save settings");
        let staging = Arc::new(MediaStagingManager::new(config.staging.clone()));

        let orchestrator = AutomationOrchestrator::new(
            config.orchestrator.clone(),
            Arc::clone(&queue),
            accounts.clone(),
            Arc::clone(&settings),
            Arc::clone(&staging),
            Arc::clone(&worker) as Arc<dyn Worker>,
            postflow_core::LogRelay::new(256),
        );

        let state = Arc::new(postflow_server::state::AppState::new(
            config.clone(),
            orchestrator.clone(),
            accounts,
            settings,
            staging,
        ));

        let router = postflow_server::api::create_router(state);

        Self {
            router,
            worker,
            orchestrator,
            queue,
            config,
            temp_dir,
        }
    }

    /// Create a post through the API and return its id.
    pub async fn create_post(&self, content: &str, account_ref: &str) -> String {
        let response = self
            .post(
                "/api/v1/posts",
                serde_json::json!({ "content": content, "accountRef": account_ref }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body["post"]["id"]
            .as_str()
            .expect("post id")
            .to_string()
    }

    /// Poll the status endpoint until the batch loop is idle.
    pub async fn wait_idle(&self) -> bool {
        for _ in 0..200 {
            let status = self.get("/api/v1/automation/status").await;
            if status.body["running"] == false && status.body["draining"] == false {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        false
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a PUT request with JSON body.
    pub async fn put(&self, path: &str, body: Value) -> TestResponse {
        self.request("PUT", path, Some(body)).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Send a POST request with a raw binary body.
    pub async fn post_bytes(&self, path: &str, bytes: Vec<u8>) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/octet-stream")
            .body(Body::from(bytes))
            .unwrap();
        self.send(request).await
    }

    /// Send a GET request and return the raw body bytes.
    pub async fn get_raw(&self, path: &str) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();
        (status, bytes.to_vec())
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        self.send(request_builder.body(body).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
