//! Mock media downloader for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::transfer::{MediaDownloader, TransferError};

/// What the mock does for a given item.
#[derive(Debug, Clone)]
pub enum MockDownload {
    /// Write a file with this extension and contents.
    File { ext: String, contents: Vec<u8> },
    /// Write a zero-byte file.
    Empty,
    /// Fail with this message.
    Fail(String),
}

impl Default for MockDownload {
    fn default() -> Self {
        Self::File {
            ext: "mp4".to_string(),
            contents: b"fake video data".to_vec(),
        }
    }
}

/// Mock implementation of the MediaDownloader trait.
///
/// Writes real files into the destination directory so the worker's
/// verification and upload steps run unchanged.
pub struct MockDownloader {
    behaviors: Arc<RwLock<HashMap<String, MockDownload>>>,
    requests: Arc<RwLock<Vec<String>>>,
    /// Simulated download duration.
    delay: Arc<RwLock<Option<Duration>>>,
}

impl Default for MockDownloader {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDownloader {
    pub fn new() -> Self {
        Self {
            behaviors: Arc::new(RwLock::new(HashMap::new())),
            requests: Arc::new(RwLock::new(Vec::new())),
            delay: Arc::new(RwLock::new(None)),
        }
    }

    /// Configure the result for one item id.
    pub async fn set_behavior(&self, item_id: &str, behavior: MockDownload) {
        self.behaviors
            .write()
            .await
            .insert(item_id.to_string(), behavior);
    }

    /// Make every download take at least this long.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// URLs requested so far.
    pub async fn requested_urls(&self) -> Vec<String> {
        self.requests.read().await.clone()
    }
}

#[async_trait]
impl MediaDownloader for MockDownloader {
    fn name(&self) -> &str {
        "mock"
    }

    async fn download(
        &self,
        url: &str,
        item_id: &str,
        dest_dir: &Path,
    ) -> Result<PathBuf, TransferError> {
        self.requests.write().await.push(url.to_string());

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let behavior = self
            .behaviors
            .read()
            .await
            .get(item_id)
            .cloned()
            .unwrap_or_default();

        match behavior {
            MockDownload::File { ext, contents } => {
                let path = dest_dir.join(format!("{item_id}.{ext}"));
                tokio::fs::write(&path, contents).await?;
                Ok(path)
            }
            MockDownload::Empty => {
                let path = dest_dir.join(format!("{item_id}.mp4"));
                tokio::fs::write(&path, b"").await?;
                Ok(path)
            }
            MockDownload::Fail(message) => Err(TransferError::download_failed(message, None)),
        }
    }
}
