//! Object storage trait and errors.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

/// User metadata attached to an uploaded object.
pub type ObjectMetadata = BTreeMap<String, String>;

/// Errors from object storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Upload of {key} failed: {message}")]
    Upload { key: String, message: String },

    #[error("Listing {prefix} failed: {message}")]
    List { prefix: String, message: String },
}

/// Durable object storage.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Bucket (or equivalent namespace) objects are written to.
    fn bucket(&self) -> &str;

    /// Upload a local file under `key`. Returns the number of bytes sent.
    async fn put_file(
        &self,
        key: &str,
        path: &Path,
        metadata: &ObjectMetadata,
    ) -> Result<u64, StorageError>;

    /// List every key under `prefix`, following pagination to the end.
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError>;
}
