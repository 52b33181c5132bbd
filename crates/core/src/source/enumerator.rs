//! Paginated enumeration of candidate items.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::SourceConfig;
use crate::metrics;

use super::{ContentItem, PageSource, SourceError};

/// Retry behaviour for transient page failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Enumeration aborts once this many failures happen in a row.
    pub max_consecutive_failures: u32,
    /// Delay after the first failure.
    pub base_delay: Duration,
    /// Cap for the exponentially growing delay.
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &SourceConfig) -> Self {
        Self {
            max_consecutive_failures: config.max_consecutive_failures.max(1),
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
            max_delay: Duration::from_millis(config.retry_max_delay_ms),
        }
    }

    /// Delay before the next attempt after `failures` consecutive failures.
    pub fn delay_for(&self, failures: u32) -> Duration {
        let exponent = failures.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&SourceConfig::default())
    }
}

/// Counters describing one enumeration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnumerationStats {
    pub pages_fetched: u32,
    pub items_seen: usize,
    pub items_skipped: usize,
    pub retries: u32,
}

/// Produces candidate streams over a page source.
pub struct SourceEnumerator {
    source: Arc<dyn PageSource>,
    retry: RetryPolicy,
}

impl SourceEnumerator {
    pub fn new(source: Arc<dyn PageSource>, retry: RetryPolicy) -> Self {
        Self { source, retry }
    }

    /// Start a fresh enumeration from page 1.
    ///
    /// Items whose id is in `filter` are skipped. The stream ends when the
    /// source runs out of pages or `max_items` candidates have been yielded.
    pub fn enumerate(
        &self,
        filter: HashSet<String>,
        page_size: u32,
        max_items: Option<usize>,
    ) -> CandidateStream {
        CandidateStream {
            source: Arc::clone(&self.source),
            retry: self.retry.clone(),
            filter,
            page_size: page_size.max(1),
            max_items,
            next_page: 1,
            buffer: VecDeque::new(),
            yielded: 0,
            exhausted: false,
            consecutive_failures: 0,
            stats: EnumerationStats::default(),
        }
    }
}

/// A lazy, finite sequence of candidate items.
///
/// Pages are fetched only when the buffered items run out. After the stream
/// returns `Ok(None)` or an error it stays finished.
pub struct CandidateStream {
    source: Arc<dyn PageSource>,
    retry: RetryPolicy,
    filter: HashSet<String>,
    page_size: u32,
    max_items: Option<usize>,
    next_page: u32,
    buffer: VecDeque<ContentItem>,
    yielded: usize,
    exhausted: bool,
    consecutive_failures: u32,
    stats: EnumerationStats,
}

impl CandidateStream {
    /// Next candidate, `Ok(None)` at the end.
    pub async fn next(&mut self) -> Result<Option<ContentItem>, SourceError> {
        loop {
            if let Some(max) = self.max_items {
                if self.yielded >= max {
                    self.exhausted = true;
                    self.buffer.clear();
                    return Ok(None);
                }
            }

            if let Some(item) = self.buffer.pop_front() {
                self.yielded += 1;
                return Ok(Some(item));
            }

            if self.exhausted {
                return Ok(None);
            }

            self.fetch_next_page().await?;
        }
    }

    pub fn stats(&self) -> EnumerationStats {
        self.stats
    }

    async fn fetch_next_page(&mut self) -> Result<(), SourceError> {
        let page = self.next_page;

        let result = loop {
            match self.source.fetch_page(page, self.page_size).await {
                Ok(result) => {
                    self.consecutive_failures = 0;
                    metrics::SOURCE_PAGES.with_label_values(&["success"]).inc();
                    break result;
                }
                Err(e) if e.is_transient() => {
                    self.consecutive_failures += 1;
                    metrics::SOURCE_PAGES.with_label_values(&["transient"]).inc();

                    if self.consecutive_failures >= self.retry.max_consecutive_failures {
                        warn!(
                            source = self.source.name(),
                            page,
                            failures = self.consecutive_failures,
                            error = %e,
                            "Too many consecutive failures, aborting enumeration"
                        );
                        self.exhausted = true;
                        return Err(SourceError::RetriesExhausted {
                            failures: self.consecutive_failures,
                            last_error: e.to_string(),
                        });
                    }

                    let delay = self.retry.delay_for(self.consecutive_failures);
                    warn!(
                        source = self.source.name(),
                        page,
                        attempt = self.consecutive_failures,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient page failure, retrying"
                    );
                    self.stats.retries += 1;
                    metrics::SOURCE_RETRIES.inc();
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    warn!(source = self.source.name(), page, error = %e, "Page fetch failed");
                    metrics::SOURCE_PAGES.with_label_values(&["terminal"]).inc();
                    self.exhausted = true;
                    return Err(e);
                }
            }
        };

        self.stats.pages_fetched += 1;

        if result.items.is_empty() {
            debug!(page, "Empty page, enumeration complete");
            self.exhausted = true;
            return Ok(());
        }

        let fetched = result.items.len();
        let mut skipped = 0;
        for item in result.items {
            if self.filter.contains(&item.id) {
                skipped += 1;
            } else {
                self.buffer.push_back(item);
            }
        }
        self.stats.items_seen += fetched;
        self.stats.items_skipped += skipped;

        info!(
            page,
            total_pages = ?result.total_pages,
            fetched,
            skipped,
            "Fetched page"
        );

        if let Some(total_pages) = result.total_pages {
            if page >= total_pages {
                debug!(page, total_pages, "Reached last page");
                self.exhausted = true;
            }
        }

        self.next_page += 1;
        Ok(())
    }
}
