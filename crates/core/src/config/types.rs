use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::coordinator::JobConfig;
use crate::transfer::TransferConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub source: SourceConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub transfer: TransferConfig,
    #[serde(default)]
    pub job: JobConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    5000
}

/// Content source (WordPress REST API) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    /// Posts endpoint, e.g. "https://example.com/wp-json/wp/v2/posts"
    #[serde(default = "default_source_url")]
    pub url: String,
    /// Posts requested per page (WordPress caps this at 100)
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    /// Request timeout in seconds
    #[serde(default = "default_source_timeout")]
    pub timeout_secs: u64,
    /// Abort enumeration after this many transient failures in a row
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,
    /// First retry delay; doubles on every further consecutive failure
    #[serde(default = "default_retry_base_delay")]
    pub retry_base_delay_ms: u64,
    /// Upper bound for the retry delay
    #[serde(default = "default_retry_max_delay")]
    pub retry_max_delay_ms: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: default_source_url(),
            per_page: default_per_page(),
            timeout_secs: default_source_timeout(),
            max_consecutive_failures: default_max_consecutive_failures(),
            retry_base_delay_ms: default_retry_base_delay(),
            retry_max_delay_ms: default_retry_max_delay(),
        }
    }
}

fn default_source_url() -> String {
    "http://localhost/wp-json/wp/v2/posts".to_string()
}

fn default_per_page() -> u32 {
    100
}

fn default_source_timeout() -> u64 {
    30
}

fn default_max_consecutive_failures() -> u32 {
    5
}

fn default_retry_base_delay() -> u64 {
    2000
}

fn default_retry_max_delay() -> u64 {
    30_000
}

/// Object storage (S3) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Target bucket
    pub bucket: String,
    /// AWS region (default: us-east-1)
    #[serde(default = "default_region")]
    pub region: String,
    /// Custom endpoint for S3-compatible services (MinIO, R2, ...)
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Use path-style addressing (needed by most S3-compatible services)
    #[serde(default)]
    pub force_path_style: bool,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

/// Ledger persistence configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub backend: LedgerBackend,
    #[serde(default = "default_ledger_path")]
    pub path: PathBuf,
    /// Where the ledger is copied before a repair rewrites it
    #[serde(default = "default_backup_path")]
    pub backup_path: PathBuf,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            backend: LedgerBackend::default(),
            path: default_ledger_path(),
            backup_path: default_backup_path(),
        }
    }
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from("uploaded_videos.json")
}

fn default_backup_path() -> PathBuf {
    PathBuf::from("uploaded_videos_backup.json")
}

/// Available ledger stores
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LedgerBackend {
    /// Flat JSON array of ids.
    #[default]
    Json,
    /// SQLite table of ids.
    Sqlite,
}
