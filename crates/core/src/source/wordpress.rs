//! WordPress REST API source.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::header::HeaderMap;
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::SourceConfig;
use crate::metrics;

use super::{ContentItem, PageSource, SourceError, SourcePage};

/// Error code WordPress returns when `page` is past the last page.
const INVALID_PAGE_CODE: &str = "rest_post_invalid_page_number";

/// Fetches posts from `/wp-json/wp/v2/posts`.
pub struct WordPressSource {
    client: Client,
    url: String,
}

impl WordPressSource {
    /// Create a new source for the configured endpoint.
    pub fn new(config: &SourceConfig) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("vidsync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SourceError::Client(e.to_string()))?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }

    fn map_request_error(e: reqwest::Error) -> SourceError {
        if e.is_timeout() {
            SourceError::Timeout
        } else if e.is_connect() || e.is_request() || e.is_body() {
            SourceError::ConnectionFailed(e.to_string())
        } else {
            SourceError::MalformedResponse(e.to_string())
        }
    }
}

#[async_trait]
impl PageSource for WordPressSource {
    fn name(&self) -> &str {
        "wordpress"
    }

    async fn fetch_page(&self, page: u32, per_page: u32) -> Result<SourcePage, SourceError> {
        let start = Instant::now();
        debug!(page, per_page, url = %self.url, "Fetching posts page");

        let result = async {
            let response = self
                .client
                .get(&self.url)
                .query(&[
                    ("page", page.to_string()),
                    ("per_page", per_page.to_string()),
                    ("orderby", "date".to_string()),
                    ("order", "desc".to_string()),
                ])
                .send()
                .await
                .map_err(Self::map_request_error)?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                if status.as_u16() == 400 && body.contains(INVALID_PAGE_CODE) {
                    debug!(page, "Page is past the end of the collection");
                    return Ok(SourcePage::default());
                }
                return Err(SourceError::Http {
                    status: status.as_u16(),
                    body: body.chars().take(200).collect(),
                });
            }

            let total_items = header_number::<u64>(response.headers(), "x-wp-total");
            let total_pages = header_number::<u32>(response.headers(), "x-wp-totalpages");

            // Body read failures (timeouts, resets) keep their transient classification
            let body = response.bytes().await.map_err(Self::map_request_error)?;
            let posts: Vec<WpPost> = serde_json::from_slice(&body)
                .map_err(|e| SourceError::MalformedResponse(e.to_string()))?;

            Ok(SourcePage {
                items: posts.into_iter().map(ContentItem::from).collect(),
                total_items,
                total_pages,
            })
        }
        .await;

        let outcome = if result.is_ok() { "success" } else { "error" };
        metrics::EXTERNAL_SERVICE_DURATION
            .with_label_values(&["wordpress", "fetch_page"])
            .observe(start.elapsed().as_secs_f64());
        metrics::EXTERNAL_SERVICE_REQUESTS
            .with_label_values(&["wordpress", "fetch_page", outcome])
            .inc();

        result
    }
}

fn header_number<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

// WordPress API response types

#[derive(Debug, Deserialize)]
struct WpPost {
    id: WpId,
    #[serde(default)]
    title: Rendered,
    #[serde(default)]
    content: Rendered,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    date_gmt: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WpId {
    Number(u64),
    Text(String),
}

#[derive(Debug, Default, Deserialize)]
struct Rendered {
    #[serde(default)]
    rendered: String,
}

impl From<WpPost> for ContentItem {
    fn from(post: WpPost) -> Self {
        let id = match post.id {
            WpId::Number(n) => n.to_string(),
            WpId::Text(s) => s,
        };
        let title = if post.title.rendered.is_empty() {
            "Unknown".to_string()
        } else {
            post.title.rendered
        };
        let published_at = post
            .date_gmt
            .as_deref()
            .and_then(parse_wp_date)
            .or_else(|| post.date.as_deref().and_then(parse_wp_date));

        ContentItem {
            id,
            title,
            raw_content: post.content.rendered,
            published_at,
        }
    }
}

/// WordPress dates are ISO 8601 without an offset; `date_gmt` is UTC.
fn parse_wp_date(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc())
        })
}
