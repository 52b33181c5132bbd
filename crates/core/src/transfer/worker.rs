//! Per-item transfer: download into a spool directory, verify, upload.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::coordinator::PendingItem;
use crate::metrics;
use crate::storage::{object_key, ObjectMetadata, ObjectStore};

use super::{MediaDownloader, TransferConfig, TransferError};

/// Extension used when the downloaded file has none.
const DEFAULT_EXTENSION: &str = "mp4";

/// Transfer state machine.
///
/// `Idle -> Downloading -> Verifying -> Uploading -> Done`, with any
/// active state able to move to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferState {
    Idle,
    Downloading,
    Verifying,
    Uploading,
    Done,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    Success,
    Failed,
}

/// Result of transferring one item.
#[derive(Debug, Clone, Serialize)]
pub struct TransferOutcome {
    pub item_id: String,
    /// Key the object was (or would have been) stored under.
    pub storage_key: Option<String>,
    pub status: TransferStatus,
    pub bytes_transferred: u64,
    pub error: Option<String>,
}

impl TransferOutcome {
    pub fn is_success(&self) -> bool {
        self.status == TransferStatus::Success
    }
}

/// Keep printable ASCII only, after truncating to `max_len` characters.
pub fn sanitize_metadata(value: &str, max_len: usize) -> String {
    value
        .chars()
        .take(max_len)
        .filter(|c| matches!(c, ' '..='~'))
        .collect()
}

/// Moves one item's media from its source URL into object storage.
///
/// The worker never retries; a failed item is left for the next run.
pub struct TransferWorker {
    downloader: Arc<dyn MediaDownloader>,
    store: Arc<dyn ObjectStore>,
    spool_root: PathBuf,
    metadata_max_len: usize,
}

impl TransferWorker {
    pub fn new(
        downloader: Arc<dyn MediaDownloader>,
        store: Arc<dyn ObjectStore>,
        config: &TransferConfig,
    ) -> Self {
        Self {
            downloader,
            store,
            spool_root: config.spool_root(),
            metadata_max_len: config.metadata_max_len,
        }
    }

    /// Transfer one item. Never returns an error: failures are reported in the outcome.
    pub async fn transfer(&self, item: &PendingItem) -> TransferOutcome {
        let mut state = TransferState::Idle;
        let mut storage_key = None;

        let result = match self.open_spool().await {
            Ok(spool) => {
                let result = self
                    .run(item, spool.path(), &mut state, &mut storage_key)
                    .await;
                let spool_path = spool.path().to_path_buf();
                if let Err(e) = spool.close() {
                    warn!(
                        item_id = %item.id,
                        dir = %spool_path.display(),
                        error = %e,
                        "Failed to remove spool directory"
                    );
                }
                result
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(bytes) => {
                transition(&item.id, &mut state, TransferState::Done);
                metrics::TRANSFERS_TOTAL
                    .with_label_values(&["success"])
                    .inc();
                metrics::BYTES_UPLOADED.inc_by(bytes);
                info!(
                    item_id = %item.id,
                    key = ?storage_key,
                    bytes,
                    "Transfer complete"
                );
                TransferOutcome {
                    item_id: item.id.clone(),
                    storage_key,
                    status: TransferStatus::Success,
                    bytes_transferred: bytes,
                    error: None,
                }
            }
            Err(e) => {
                let failed_in = state;
                transition(&item.id, &mut state, TransferState::Failed);
                metrics::TRANSFERS_TOTAL
                    .with_label_values(&[e.metric_label()])
                    .inc();
                warn!(
                    item_id = %item.id,
                    state = ?failed_in,
                    error = %e,
                    "Transfer failed"
                );
                TransferOutcome {
                    item_id: item.id.clone(),
                    storage_key,
                    status: TransferStatus::Failed,
                    bytes_transferred: 0,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    async fn open_spool(&self) -> Result<TempDir, TransferError> {
        tokio::fs::create_dir_all(&self.spool_root).await?;
        let spool = tempfile::Builder::new()
            .prefix("vidsync-")
            .tempdir_in(&self.spool_root)?;
        Ok(spool)
    }

    async fn run(
        &self,
        item: &PendingItem,
        spool: &Path,
        state: &mut TransferState,
        storage_key: &mut Option<String>,
    ) -> Result<u64, TransferError> {
        transition(&item.id, state, TransferState::Downloading);
        let start = Instant::now();
        let file = self
            .downloader
            .download(&item.media_url, &item.id, spool)
            .await?;
        metrics::TRANSFER_DURATION
            .with_label_values(&["download"])
            .observe(start.elapsed().as_secs_f64());

        transition(&item.id, state, TransferState::Verifying);
        let size = match tokio::fs::metadata(&file).await {
            Ok(meta) if meta.is_file() && meta.len() > 0 => meta.len(),
            _ => return Err(TransferError::EmptyDownload { path: file }),
        };

        transition(&item.id, state, TransferState::Uploading);
        let ext = file
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty())
            .unwrap_or(DEFAULT_EXTENSION);
        let key = object_key(&item.id, ext);
        *storage_key = Some(key.clone());

        let metadata = self.metadata_for(item);
        let start = Instant::now();
        let bytes = self.store.put_file(&key, &file, &metadata).await?;
        metrics::TRANSFER_DURATION
            .with_label_values(&["upload"])
            .observe(start.elapsed().as_secs_f64());

        debug!(item_id = %item.id, key = %key, size, bytes, "Uploaded media");
        Ok(bytes)
    }

    fn metadata_for(&self, item: &PendingItem) -> ObjectMetadata {
        let mut metadata = ObjectMetadata::new();
        metadata.insert("post-id".to_string(), item.id.clone());
        metadata.insert(
            "post-title".to_string(),
            sanitize_metadata(&item.title, self.metadata_max_len),
        );
        metadata.insert(
            "youtube-url".to_string(),
            sanitize_metadata(&item.media_url, self.metadata_max_len),
        );
        metadata.insert("upload-date".to_string(), Utc::now().to_rfc3339());
        metadata
    }
}

fn transition(item_id: &str, state: &mut TransferState, next: TransferState) {
    debug!(item_id = %item_id, from = ?*state, to = ?next, "Transfer state change");
    *state = next;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockDownload, MockDownloader, MockObjectStore};

    fn worker(
        downloader: &Arc<MockDownloader>,
        store: &Arc<MockObjectStore>,
        spool: &Path,
    ) -> TransferWorker {
        let config = TransferConfig::default().with_spool_dir(spool.to_path_buf());
        TransferWorker::new(
            Arc::clone(downloader) as Arc<dyn MediaDownloader>,
            Arc::clone(store) as Arc<dyn ObjectStore>,
            &config,
        )
    }

    fn spool_is_empty(dir: &Path) -> bool {
        std::fs::read_dir(dir).unwrap().next().is_none()
    }

    #[test]
    fn test_sanitize_metadata() {
        assert_eq!(sanitize_metadata("Plain title", 1000), "Plain title");
        assert_eq!(sanitize_metadata("Café – Ünïcode", 1000), "Caf  ncode");
        assert_eq!(sanitize_metadata("tab\there\nnewline", 1000), "tabherenewline");
        assert_eq!(sanitize_metadata(&"a".repeat(1500), 1000).len(), 1000);
    }

    #[tokio::test]
    async fn test_successful_transfer() {
        let spool = tempfile::TempDir::new().unwrap();
        let downloader = Arc::new(MockDownloader::new());
        let store = Arc::new(MockObjectStore::new());
        let worker = worker(&downloader, &store, spool.path());

        let item = fixtures::pending_item("42", "My Post", "dQw4w9WgXcQ");
        let outcome = worker.transfer(&item).await;

        assert!(outcome.is_success());
        assert_eq!(outcome.storage_key.as_deref(), Some("videos/42.mp4"));
        assert!(outcome.bytes_transferred > 0);

        let object = store.object("videos/42.mp4").await.unwrap();
        assert_eq!(object.metadata["post-id"], "42");
        assert_eq!(object.metadata["post-title"], "My Post");
        assert_eq!(
            object.metadata["youtube-url"],
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        );
        assert!(object.metadata.contains_key("upload-date"));

        assert!(spool_is_empty(spool.path()));
    }

    #[tokio::test]
    async fn test_empty_download_fails_and_cleans_up() {
        let spool = tempfile::TempDir::new().unwrap();
        let downloader = Arc::new(MockDownloader::new());
        downloader.set_behavior("7", MockDownload::Empty).await;
        let store = Arc::new(MockObjectStore::new());
        let worker = worker(&downloader, &store, spool.path());

        let outcome = worker
            .transfer(&fixtures::pending_item("7", "Empty", "dQw4w9WgXcQ"))
            .await;

        assert!(!outcome.is_success());
        assert!(outcome.error.unwrap().contains("empty"));
        assert!(store.keys().await.is_empty());
        assert!(spool_is_empty(spool.path()));
    }

    #[tokio::test]
    async fn test_download_failure() {
        let spool = tempfile::TempDir::new().unwrap();
        let downloader = Arc::new(MockDownloader::new());
        downloader
            .set_behavior("8", MockDownload::Fail("Video unavailable".to_string()))
            .await;
        let store = Arc::new(MockObjectStore::new());
        let worker = worker(&downloader, &store, spool.path());

        let outcome = worker
            .transfer(&fixtures::pending_item("8", "Gone", "dQw4w9WgXcQ"))
            .await;

        assert_eq!(outcome.status, TransferStatus::Failed);
        assert!(outcome.storage_key.is_none());
        assert!(outcome.error.unwrap().contains("Video unavailable"));
        assert!(spool_is_empty(spool.path()));
    }

    #[tokio::test]
    async fn test_upload_failure() {
        let spool = tempfile::TempDir::new().unwrap();
        let downloader = Arc::new(MockDownloader::new());
        let store = Arc::new(MockObjectStore::new());
        store.set_fail_uploads(true).await;
        let worker = worker(&downloader, &store, spool.path());

        let outcome = worker
            .transfer(&fixtures::pending_item("9", "Post", "dQw4w9WgXcQ"))
            .await;

        assert_eq!(outcome.status, TransferStatus::Failed);
        assert_eq!(outcome.storage_key.as_deref(), Some("videos/9.mp4"));
        assert!(spool_is_empty(spool.path()));
    }

    #[tokio::test]
    async fn test_extension_follows_download() {
        let spool = tempfile::TempDir::new().unwrap();
        let downloader = Arc::new(MockDownloader::new());
        downloader
            .set_behavior(
                "10",
                MockDownload::File {
                    ext: "webm".to_string(),
                    contents: b"webm bytes".to_vec(),
                },
            )
            .await;
        let store = Arc::new(MockObjectStore::new());
        let worker = worker(&downloader, &store, spool.path());

        let outcome = worker
            .transfer(&fixtures::pending_item("10", "Post", "dQw4w9WgXcQ"))
            .await;

        assert_eq!(outcome.storage_key.as_deref(), Some("videos/10.webm"));
        assert_eq!(outcome.bytes_transferred, 10);
    }

    #[tokio::test]
    async fn test_title_is_sanitized_in_metadata() {
        let spool = tempfile::TempDir::new().unwrap();
        let downloader = Arc::new(MockDownloader::new());
        let store = Arc::new(MockObjectStore::new());
        let worker = worker(&downloader, &store, spool.path());

        worker
            .transfer(&fixtures::pending_item("11", "Ñandú ★ Show", "dQw4w9WgXcQ"))
            .await;

        let object = store.object("videos/11.mp4").await.unwrap();
        assert_eq!(object.metadata["post-title"], "and  Show");
    }
}
