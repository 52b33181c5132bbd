//! Configuration for the transfer worker and downloader.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for downloading media and uploading it to storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Path to the yt-dlp binary.
    #[serde(default = "default_yt_dlp_path")]
    pub yt_dlp_path: PathBuf,

    /// yt-dlp format selector. Must select a single file (no merging).
    #[serde(default = "default_format")]
    pub format: String,

    /// Directory spool directories are created in (default: system temp dir).
    #[serde(default)]
    pub spool_dir: Option<PathBuf>,

    /// Netscape-format cookies file passed to yt-dlp.
    #[serde(default)]
    pub cookies_file: Option<PathBuf>,

    /// User agent passed to yt-dlp.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Timeout for a single download in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum length of each object metadata value.
    #[serde(default = "default_metadata_max_len")]
    pub metadata_max_len: usize,
}

fn default_yt_dlp_path() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_format() -> String {
    "best[ext=mp4]/best".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

fn default_timeout() -> u64 {
    3600 // 1 hour
}

fn default_metadata_max_len() -> usize {
    1000
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            yt_dlp_path: default_yt_dlp_path(),
            format: default_format(),
            spool_dir: None,
            cookies_file: None,
            user_agent: default_user_agent(),
            timeout_secs: default_timeout(),
            metadata_max_len: default_metadata_max_len(),
        }
    }
}

impl TransferConfig {
    /// Directory spool directories are created in.
    pub fn spool_root(&self) -> PathBuf {
        self.spool_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Sets the spool directory.
    pub fn with_spool_dir(mut self, spool_dir: PathBuf) -> Self {
        self.spool_dir = Some(spool_dir);
        self
    }

    /// Sets the cookies file.
    pub fn with_cookies_file(mut self, cookies_file: PathBuf) -> Self {
        self.cookies_file = Some(cookies_file);
        self
    }

    /// Sets the timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}
