//! Media reference extraction.
//!
//! Turns the rendered HTML of a post into a canonical YouTube watch URL.
//! Recognition is driven by an ordered rule table: the first rule that
//! produces an accepted token wins, so well-formed link shapes are always
//! preferred over the permissive catch-all.

use once_cell::sync::Lazy;
use regex_lite::Regex;

use crate::source::ContentItem;

/// Length of a YouTube video id.
pub const TOKEN_LEN: usize = 11;

/// Character class of a video id.
const TOKEN_CHARS: &str = "A-Za-z0-9_-";

/// Literals with the shape of a video id that appear in YouTube URLs
/// without being one.
const TOKEN_BLACKLIST: &[&str] = &["videoseries", "live_stream", "playlist_id", "subscriptio"];

/// A media reference derived from a content item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaReference {
    pub item_id: String,
    pub canonical_url: String,
}

/// Result of a successful classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaMatch {
    /// Name of the rule that matched.
    pub rule: &'static str,
    /// The extracted video id.
    pub token: String,
    /// Canonical watch URL.
    pub canonical_url: String,
}

struct Rule {
    name: &'static str,
    pattern: Regex,
    canonicalize: fn(&str) -> String,
}

impl Rule {
    fn new(name: &'static str, prefix: &str) -> Self {
        // The trailing group stands in for a look-ahead: the token must not
        // run on into more id characters.
        let source = format!(
            "{prefix}([{chars}]{{{len}}})(?:[^{chars}]|$)",
            chars = TOKEN_CHARS,
            len = TOKEN_LEN
        );
        Self {
            name,
            pattern: Regex::new(&source).expect("media rule pattern must compile"),
            canonicalize: watch_url,
        }
    }

    /// First token accepted by the blacklist post-filter, if any.
    fn find(&self, content: &str) -> Option<String> {
        self.pattern
            .captures_iter(content)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
            .find(|token| !is_blacklisted(token))
            .map(str::to_string)
    }
}

fn watch_url(token: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", token)
}

fn is_blacklisted(token: &str) -> bool {
    TOKEN_BLACKLIST
        .iter()
        .any(|word| word.eq_ignore_ascii_case(token))
}

/// Query string up to the `v` parameter, tolerating `&amp;` from HTML.
const QUERY_BEFORE_V: &str = r#"(?:[^"'\s<>]*&(?:amp;)?)?v="#;

/// Rules in priority order, most specific first.
static RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule::new("watch", &format!(r"youtube\.com/watch\?{}", QUERY_BEFORE_V)),
        Rule::new("embed", r"youtube(?:-nocookie)?\.com/embed/"),
        Rule::new("short", r"youtu\.be/"),
        Rule::new(
            "short_query",
            &format!(r"youtu\.be/(?:watch)?\?{}", QUERY_BEFORE_V),
        ),
        Rule::new("catch_all", r#"youtu(?:be\.com|\.be)[^"'\s<>]*?[/=]"#),
    ]
});

/// Stateless classifier for post content.
#[derive(Debug, Clone, Copy, Default)]
pub struct MediaReferenceExtractor;

impl MediaReferenceExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Classify raw content, reporting which rule matched.
    pub fn classify(&self, raw_content: &str) -> Option<MediaMatch> {
        RULES.iter().find_map(|rule| {
            rule.find(raw_content).map(|token| MediaMatch {
                rule: rule.name,
                canonical_url: (rule.canonicalize)(&token),
                token,
            })
        })
    }

    /// Canonical media URL embedded in `raw_content`, if any.
    pub fn extract(&self, raw_content: &str) -> Option<String> {
        self.classify(raw_content).map(|m| m.canonical_url)
    }

    /// Media reference for a content item, if it carries one.
    pub fn reference(&self, item: &ContentItem) -> Option<MediaReference> {
        self.extract(&item.raw_content).map(|canonical_url| MediaReference {
            item_id: item.id.clone(),
            canonical_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "1ArkKtDlGOc";
    const CANONICAL: &str = "https://www.youtube.com/watch?v=1ArkKtDlGOc";

    fn extract(content: &str) -> Option<String> {
        MediaReferenceExtractor::new().extract(content)
    }

    #[test]
    fn test_surface_forms_normalize_to_one_url() {
        let inputs = [
            format!(r#"<iframe src="https://www.youtube.com/embed/{}?feature=oembed"></iframe>"#, ID),
            format!(r#"<a href="https://youtu.be/{}">watch</a>"#, ID),
            format!(r#"<a href="https://www.youtube.com/watch?v={}">watch</a>"#, ID),
            format!("https://youtu.be/?v={}&t=30", ID),
            format!("https://www.youtube-nocookie.com/embed/{}", ID),
            format!("https://www.youtube.com/watch?feature=share&amp;v={}", ID),
        ];

        for input in &inputs {
            assert_eq!(extract(input).as_deref(), Some(CANONICAL), "input: {}", input);
        }
    }

    #[test]
    fn test_extract_is_idempotent() {
        let content = format!("<p>intro</p><p>https://youtu.be/{}</p>", ID);
        assert_eq!(extract(&content), extract(&content));
    }

    #[test]
    fn test_watch_link_beats_catch_all_decoy() {
        let content = format!(
            r#"<a href="https://www.youtube.com/attribution_link?a=DecoyDecoy1">x</a>
               <a href="https://www.youtube.com/watch?v={}">y</a>"#,
            ID
        );
        let m = MediaReferenceExtractor::new().classify(&content).unwrap();
        assert_eq!(m.rule, "watch");
        assert_eq!(m.canonical_url, CANONICAL);
    }

    #[test]
    fn test_catch_all_alone_matches() {
        let m = MediaReferenceExtractor::new()
            .classify("https://www.youtube.com/attribution_link?a=DecoyDecoy1&u=/x")
            .unwrap();
        assert_eq!(m.rule, "catch_all");
        assert_eq!(m.token, "DecoyDecoy1");
    }

    #[test]
    fn test_blacklisted_tokens_are_skipped() {
        assert_eq!(
            extract("https://www.youtube.com/embed/videoseries?list=PL0123456789abcdef"),
            None
        );
        assert_eq!(
            extract("https://www.youtube.com/embed/live_stream?channel=UCabc"),
            None
        );

        // A later genuine reference is still found.
        let content = format!(
            "https://www.youtube.com/embed/videoseries?list=PLx https://youtu.be/{}",
            ID
        );
        assert_eq!(extract(&content).as_deref(), Some(CANONICAL));
    }

    #[test]
    fn test_catch_all_skips_url_words() {
        assert_eq!(extract("https://www.youtube.com/feed/playlist_id?x=1"), None);
        assert_eq!(
            extract("https://www.youtube.com/user/x?sub_confirmation=subscriptio"),
            None
        );
        assert_eq!(extract("https://www.youtube.com/feed/Playlist_Id?x=1"), None);

        let m = MediaReferenceExtractor::new()
            .classify(
                "https://www.youtube.com/feed/playlist_id?x=1 \
                 https://www.youtube.com/attribution_link?a=DecoyDecoy1",
            )
            .unwrap();
        assert_eq!(m.rule, "catch_all");
        assert_eq!(m.token, "DecoyDecoy1");
    }

    #[test]
    fn test_token_must_be_exact_length() {
        assert_eq!(extract("https://youtu.be/short"), None);
        assert_eq!(extract("https://www.youtube.com/watch?v=waytoolongtoken42"), None);
    }

    #[test]
    fn test_no_match_and_malformed_input() {
        assert_eq!(extract(""), None);
        assert_eq!(extract("<p>No video in this post.</p>"), None);
        assert_eq!(extract("https://vimeo.com/123456789"), None);
        assert_eq!(extract("youtube.com/watch?v=<<<>>>"), None);
    }

    #[test]
    fn test_reference_carries_item_id() {
        let item = ContentItem {
            id: "4242".to_string(),
            title: "Post".to_string(),
            raw_content: format!("https://youtu.be/{}", ID),
            published_at: None,
        };
        let reference = MediaReferenceExtractor::new().reference(&item).unwrap();
        assert_eq!(reference.item_id, "4242");
        assert_eq!(reference.canonical_url, CANONICAL);
    }
}
