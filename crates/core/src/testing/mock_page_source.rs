//! Mock page source for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::source::{ContentItem, PageSource, SourceError, SourcePage};

/// Mock implementation of the PageSource trait.
///
/// Serves a fixed list of pages (1-based); pages past the end come back
/// empty. Queued errors are returned one per request before any page is
/// served, and every request is recorded, including failed ones.
///
/// # Example
///
/// ```rust,ignore
/// use vidsync_core::testing::{fixtures, MockPageSource};
///
/// let source = MockPageSource::new()
///     .with_pages(fixtures::numbered_pages(3, 100))
///     .with_total_pages(3);
/// source.push_error(SourceError::Timeout).await;
///
/// // ... enumerate ...
///
/// assert_eq!(source.requested_pages().await, vec![1, 1, 2, 3]);
/// ```
pub struct MockPageSource {
    pages: Arc<RwLock<Vec<Vec<ContentItem>>>>,
    /// Value reported as the total page count.
    total_pages: Arc<RwLock<Option<u32>>>,
    errors: Arc<RwLock<VecDeque<SourceError>>>,
    requests: Arc<RwLock<Vec<u32>>>,
}

impl Default for MockPageSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPageSource {
    /// Create a source with no pages.
    pub fn new() -> Self {
        Self {
            pages: Arc::new(RwLock::new(Vec::new())),
            total_pages: Arc::new(RwLock::new(None)),
            errors: Arc::new(RwLock::new(VecDeque::new())),
            requests: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Serve these pages.
    pub fn with_pages(self, pages: Vec<Vec<ContentItem>>) -> Self {
        Self {
            pages: Arc::new(RwLock::new(pages)),
            ..self
        }
    }

    /// Report this total page count.
    pub fn with_total_pages(self, total_pages: u32) -> Self {
        Self {
            total_pages: Arc::new(RwLock::new(Some(total_pages))),
            ..self
        }
    }

    /// Replace the served pages.
    pub async fn set_pages(&self, pages: Vec<Vec<ContentItem>>) {
        *self.pages.write().await = pages;
    }

    /// Queue an error for the next request.
    pub async fn push_error(&self, error: SourceError) {
        self.errors.write().await.push_back(error);
    }

    /// Every page number requested so far.
    pub async fn requested_pages(&self) -> Vec<u32> {
        self.requests.read().await.clone()
    }
}

#[async_trait]
impl PageSource for MockPageSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_page(&self, page: u32, _per_page: u32) -> Result<SourcePage, SourceError> {
        self.requests.write().await.push(page);

        if let Some(error) = self.errors.write().await.pop_front() {
            return Err(error);
        }

        let pages = self.pages.read().await;
        let items = page
            .checked_sub(1)
            .and_then(|i| pages.get(i as usize))
            .cloned()
            .unwrap_or_default();
        let total_items = pages.iter().map(|p| p.len() as u64).sum();

        Ok(SourcePage {
            items,
            total_items: Some(total_items),
            total_pages: *self.total_pages.read().await,
        })
    }
}
