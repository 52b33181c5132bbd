//! Types for the content source.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A content item (post) fetched from the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    /// Source-assigned identifier, stringified.
    pub id: String,
    pub title: String,
    /// Rendered HTML body.
    pub raw_content: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// One page of results plus the pagination totals the source reported.
#[derive(Debug, Clone, Default)]
pub struct SourcePage {
    pub items: Vec<ContentItem>,
    /// Total item count (`X-WP-Total`), when reported.
    pub total_items: Option<u64>,
    /// Total page count (`X-WP-TotalPages`), when reported.
    pub total_pages: Option<u32>,
}

/// Errors from the content source.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    #[error("Source request timed out")]
    Timeout,

    #[error("Source connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Source returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Malformed source response: {0}")]
    MalformedResponse(String),

    #[error("Giving up after {failures} consecutive failures, last error: {last_error}")]
    RetriesExhausted { failures: u32, last_error: String },

    #[error("Source client error: {0}")]
    Client(String),
}

impl SourceError {
    /// Whether the request may succeed if repeated (timeouts, connection
    /// failures, 429 and 5xx).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout | Self::ConnectionFailed(_) => true,
            Self::Http { status, .. } => *status == 429 || (500..=599).contains(status),
            _ => false,
        }
    }
}

/// A paginated content source.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Source name for logging.
    fn name(&self) -> &str;

    /// Fetch one page (1-based). An empty page means there is nothing more.
    async fn fetch_page(&self, page: u32, per_page: u32) -> Result<SourcePage, SourceError>;
}
