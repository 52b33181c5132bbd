//! Error types for the transfer module.

use std::path::PathBuf;
use thiserror::Error;

use crate::storage::StorageError;

/// Errors that can fail a single item transfer.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Downloader binary not found.
    #[error("Downloader not found at path: {path}")]
    DownloaderMissing { path: PathBuf },

    /// Downloader ran but did not produce media.
    #[error("Download failed: {reason}")]
    DownloadFailed {
        reason: String,
        stderr: Option<String>,
    },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Downloaded file is missing or has zero bytes.
    #[error("Downloaded file is empty or missing: {path}")]
    EmptyDownload { path: PathBuf },

    /// Upload to object storage failed.
    #[error("Upload failed: {0}")]
    UploadFailed(#[from] StorageError),

    /// I/O error while managing the spool directory.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransferError {
    /// Create a download failure.
    pub fn download_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::DownloadFailed {
            reason: reason.into(),
            stderr,
        }
    }

    /// Label used for the transfer outcome metric.
    pub fn metric_label(&self) -> &'static str {
        match self {
            Self::DownloaderMissing { .. } | Self::DownloadFailed { .. } | Self::Timeout { .. } => {
                "download_failed"
            }
            Self::EmptyDownload { .. } => "empty_download",
            Self::UploadFailed(_) => "upload_failed",
            Self::Io(_) => "io_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TransferError::Timeout { timeout_secs: 60 };
        assert_eq!(err.to_string(), "Download timed out after 60 seconds");

        let err = TransferError::download_failed("yt-dlp exited with code 1", None);
        assert_eq!(err.to_string(), "Download failed: yt-dlp exited with code 1");

        let err = TransferError::EmptyDownload {
            path: PathBuf::from("/tmp/vidsync-x/1.mp4"),
        };
        assert!(err.to_string().contains("/tmp/vidsync-x/1.mp4"));
    }

    #[test]
    fn test_metric_labels() {
        assert_eq!(
            TransferError::Timeout { timeout_secs: 1 }.metric_label(),
            "download_failed"
        );
        assert_eq!(
            TransferError::EmptyDownload {
                path: PathBuf::new()
            }
            .metric_label(),
            "empty_download"
        );
        assert_eq!(
            TransferError::UploadFailed(StorageError::Upload {
                key: "videos/1.mp4".to_string(),
                message: "denied".to_string(),
            })
            .metric_label(),
            "upload_failed"
        );
    }
}
