//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of every external seam
//! (content source, downloader, object store), allowing full runs to be
//! tested without WordPress, yt-dlp or S3.
//!
//! # Example
//!
//! ```rust,ignore
//! use vidsync_core::testing::{fixtures, MockDownloader, MockObjectStore, MockPageSource};
//!
//! let source = Arc::new(MockPageSource::new().with_pages(vec![vec![
//!     fixtures::post_with_video("1", "dQw4w9WgXcQ"),
//!     fixtures::post_without_video("2"),
//! ]]));
//! let downloader = Arc::new(MockDownloader::new());
//! let store = Arc::new(MockObjectStore::new());
//!
//! // Build a coordinator from these...
//! ```

mod mock_downloader;
mod mock_object_store;
mod mock_page_source;

pub use mock_downloader::{MockDownload, MockDownloader};
pub use mock_object_store::{MockObjectStore, StoredObject};
pub use mock_page_source::MockPageSource;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::coordinator::PendingItem;
    use crate::source::ContentItem;

    /// Create a content item.
    pub fn content_item(id: &str, title: &str, raw_content: &str) -> ContentItem {
        ContentItem {
            id: id.to_string(),
            title: title.to_string(),
            raw_content: raw_content.to_string(),
            published_at: None,
        }
    }

    /// A post embedding a YouTube player for `token`.
    pub fn post_with_video(id: &str, token: &str) -> ContentItem {
        content_item(
            id,
            &format!("Post {}", id),
            &format!(
                "<p>Watch this.</p>\n<figure><iframe width=\"560\" height=\"315\" \
                 src=\"https://www.youtube.com/embed/{}?feature=oembed\" \
                 frameborder=\"0\" allowfullscreen></iframe></figure>",
                token
            ),
        )
    }

    /// A post with no media reference.
    pub fn post_without_video(id: &str) -> ContentItem {
        content_item(
            id,
            &format!("Post {}", id),
            "<p>Just text, and a link to <a href=\"https://example.com\">a site</a>.</p>",
        )
    }

    /// `pages` full pages of text-only posts with sequential ids starting at "1".
    pub fn numbered_pages(pages: usize, per_page: usize) -> Vec<Vec<ContentItem>> {
        (0..pages)
            .map(|p| {
                (1..=per_page)
                    .map(|i| post_without_video(&(p * per_page + i).to_string()))
                    .collect()
            })
            .collect()
    }

    /// A pending item pointing at the canonical URL for `token`.
    pub fn pending_item(id: &str, title: &str, token: &str) -> PendingItem {
        PendingItem {
            id: id.to_string(),
            title: title.to_string(),
            media_url: format!("https://www.youtube.com/watch?v={}", token),
            published_at: None,
        }
    }
}
