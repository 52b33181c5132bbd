//! S3 object store backed by aws-sdk-s3.

use std::path::Path;
use std::time::Instant;

use async_trait::async_trait;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, info};

use crate::config::StorageConfig;
use crate::metrics;

use super::{ObjectMetadata, ObjectStore, StorageError};

/// S3 (or S3-compatible) object store.
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Build a client from configuration.
    ///
    /// Credentials come from the standard AWS provider chain.
    pub async fn from_config(config: &StorageConfig) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let shared = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(config.force_path_style)
            .build();

        info!(
            bucket = %config.bucket,
            region = %config.region,
            endpoint = ?config.endpoint,
            "Configured S3 object store"
        );

        Self::new(Client::from_conf(s3_config), config.bucket.clone())
    }

    fn record(operation: &str, start: Instant, ok: bool) {
        metrics::EXTERNAL_SERVICE_DURATION
            .with_label_values(&["s3", operation])
            .observe(start.elapsed().as_secs_f64());
        metrics::EXTERNAL_SERVICE_REQUESTS
            .with_label_values(&["s3", operation, if ok { "success" } else { "error" }])
            .inc();
    }
}

/// Content type from a file extension.
fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("mp4") | Some("m4v") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mkv") => "video/x-matroska",
        Some("mov") => "video/quicktime",
        Some("3gp") => "video/3gpp",
        _ => "application/octet-stream",
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    fn name(&self) -> &str {
        "s3"
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put_file(
        &self,
        key: &str,
        path: &Path,
        metadata: &ObjectMetadata,
    ) -> Result<u64, StorageError> {
        let size = tokio::fs::metadata(path)
            .await
            .map_err(|e| StorageError::Io {
                path: path.to_path_buf(),
                source: e,
            })?
            .len();

        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StorageError::Upload {
                key: key.to_string(),
                message: e.to_string(),
            })?;

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_length(size as i64)
            .content_type(content_type_for(path));
        for (name, value) in metadata {
            request = request.metadata(name, value);
        }

        let start = Instant::now();
        let result = request.send().await;
        Self::record("put_object", start, result.is_ok());

        result.map_err(|e| StorageError::Upload {
            key: key.to_string(),
            message: DisplayErrorContext(&e).to_string(),
        })?;

        debug!(bucket = %self.bucket, key = %key, bytes = size, "Uploaded object");
        Ok(size)
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let mut keys = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let start = Instant::now();
            let result = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .set_continuation_token(continuation.take())
                .send()
                .await;
            Self::record("list_objects", start, result.is_ok());

            let response = result.map_err(|e| StorageError::List {
                prefix: prefix.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

            keys.extend(
                response
                    .contents()
                    .iter()
                    .filter_map(|object| object.key().map(str::to_string)),
            );

            match response.next_continuation_token() {
                Some(token) if response.is_truncated().unwrap_or(false) => {
                    continuation = Some(token.to_string());
                }
                _ => break,
            }
        }

        debug!(bucket = %self.bucket, prefix = %prefix, count = keys.len(), "Listed objects");
        Ok(keys)
    }
}
