//! Content source abstraction.
//!
//! A `PageSource` serves pages of posts; `SourceEnumerator` walks those
//! pages lazily, retrying transient failures and skipping items that are
//! already in the ledger.

mod enumerator;
mod types;
mod wordpress;

pub use enumerator::{CandidateStream, EnumerationStats, RetryPolicy, SourceEnumerator};
pub use types::{ContentItem, PageSource, SourceError, SourcePage};
pub use wordpress::WordPressSource;
