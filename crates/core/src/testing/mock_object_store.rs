//! Mock object store for testing.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::storage::{ObjectMetadata, ObjectStore, StorageError};

/// An object held by the mock store.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub size: u64,
    pub metadata: ObjectMetadata,
}

/// In-memory implementation of the ObjectStore trait.
pub struct MockObjectStore {
    objects: Arc<RwLock<BTreeMap<String, StoredObject>>>,
    fail_uploads: Arc<RwLock<bool>>,
    fail_list: Arc<RwLock<bool>>,
}

impl Default for MockObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockObjectStore {
    pub fn new() -> Self {
        Self {
            objects: Arc::new(RwLock::new(BTreeMap::new())),
            fail_uploads: Arc::new(RwLock::new(false)),
            fail_list: Arc::new(RwLock::new(false)),
        }
    }

    /// Add an object directly, as if uploaded out of band.
    pub async fn insert_key(&self, key: &str) {
        self.objects.write().await.insert(
            key.to_string(),
            StoredObject {
                size: 1,
                metadata: ObjectMetadata::new(),
            },
        );
    }

    /// Remove an object, as if deleted out of band.
    pub async fn remove_key(&self, key: &str) {
        self.objects.write().await.remove(key);
    }

    /// All keys, sorted.
    pub async fn keys(&self) -> Vec<String> {
        self.objects.read().await.keys().cloned().collect()
    }

    pub async fn object(&self, key: &str) -> Option<StoredObject> {
        self.objects.read().await.get(key).cloned()
    }

    /// Make every upload fail.
    pub async fn set_fail_uploads(&self, fail: bool) {
        *self.fail_uploads.write().await = fail;
    }

    /// Make every listing fail.
    pub async fn set_fail_list(&self, fail: bool) {
        *self.fail_list.write().await = fail;
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    fn name(&self) -> &str {
        "mock"
    }

    fn bucket(&self) -> &str {
        "mock-bucket"
    }

    async fn put_file(
        &self,
        key: &str,
        path: &Path,
        metadata: &ObjectMetadata,
    ) -> Result<u64, StorageError> {
        if *self.fail_uploads.read().await {
            return Err(StorageError::Upload {
                key: key.to_string(),
                message: "simulated upload failure".to_string(),
            });
        }

        let size = tokio::fs::metadata(path)
            .await
            .map_err(|e| StorageError::Io {
                path: path.to_path_buf(),
                source: e,
            })?
            .len();

        self.objects.write().await.insert(
            key.to_string(),
            StoredObject {
                size,
                metadata: metadata.clone(),
            },
        );
        Ok(size)
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        if *self.fail_list.read().await {
            return Err(StorageError::List {
                prefix: prefix.to_string(),
                message: "simulated listing failure".to_string(),
            });
        }

        Ok(self
            .objects
            .read()
            .await
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }
}
