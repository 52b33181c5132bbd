//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that builds the real router over a
//! coordinator wired to mock dependencies, enabling API tests without
//! WordPress, yt-dlp or S3.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use vidsync_core::{
    testing::{MockDownloader, MockObjectStore, MockPageSource},
    Config, DedupLedger, JobConfig, JobCoordinator, JsonFileLedgerStore, LedgerBackend,
    LedgerConfig, RetryPolicy, ServerConfig, SourceConfig, SourceEnumerator, StorageConfig,
    TransferConfig, TransferWorker,
};
use vidsync_server::state::AppState;

/// Re-export fixtures for test convenience
pub use vidsync_core::testing::fixtures;

/// Test fixture for API testing with mock dependencies.
///
/// Provides an in-process router with fully controllable mocks for:
/// - The content source (MockPageSource)
/// - Media downloads (MockDownloader)
/// - Object storage (MockObjectStore)
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_start() {
///     let fixture = TestFixture::new(vec![vec![fixtures::post_with_video("1", "dQw4w9WgXcQ")]]);
///
///     let response = fixture.post("/api/v1/upload/start", json!({})).await;
///
///     assert_eq!(response.status, 202);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    pub coordinator: Arc<JobCoordinator>,
    pub source: Arc<MockPageSource>,
    pub downloader: Arc<MockDownloader>,
    pub store: Arc<MockObjectStore>,
    /// Temporary directory for the ledger, its backup and the spool
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a fixture serving `pages` from the mock source.
    pub fn new(pages: Vec<Vec<vidsync_core::ContentItem>>) -> Self {
        Self::with_job_config(pages, JobConfig::default())
    }

    /// Create a fixture with a custom job section.
    pub fn with_job_config(pages: Vec<Vec<vidsync_core::ContentItem>>, job: JobConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let source = Arc::new(MockPageSource::new().with_pages(pages));
        let downloader = Arc::new(MockDownloader::new());
        let store = Arc::new(MockObjectStore::new());

        let config = Config {
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            source: SourceConfig::default(),
            storage: StorageConfig {
                bucket: "mock-bucket".to_string(),
                region: "eu-west-1".to_string(),
                endpoint: None,
                force_path_style: false,
            },
            ledger: LedgerConfig {
                backend: LedgerBackend::Json,
                path: temp_dir.path().join("uploaded_videos.json"),
                backup_path: temp_dir.path().join("uploaded_videos_backup.json"),
            },
            transfer: TransferConfig::default().with_spool_dir(temp_dir.path().join("spool")),
            job,
        };

        let ledger = Arc::new(
            DedupLedger::open(Box::new(JsonFileLedgerStore::new(&config.ledger.path)))
                .expect("Failed to open ledger"),
        );
        let retry = RetryPolicy {
            max_consecutive_failures: 2,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        };
        let worker = TransferWorker::new(downloader.clone(), store.clone(), &config.transfer);
        let coordinator = Arc::new(JobCoordinator::new(
            SourceEnumerator::new(source.clone(), retry),
            ledger,
            store.clone(),
            worker,
            config.source.per_page,
        ));

        let state = Arc::new(AppState::new(config, Arc::clone(&coordinator)));
        let router = vidsync_server::api::create_router(state);

        Self {
            router,
            coordinator,
            source,
            downloader,
            store,
            temp_dir,
        }
    }

    pub fn backup_path(&self) -> PathBuf {
        self.temp_dir.path().join("uploaded_videos_backup.json")
    }

    /// Wait until the active run, if any, has finished.
    pub async fn wait_for_run(&self) {
        self.coordinator.wait().await;
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

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// GET a non-JSON endpoint and return the body text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
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
        (status, String::from_utf8_lossy(&bytes).into_owned())
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
