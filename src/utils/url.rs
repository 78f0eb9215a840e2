// src/utils/url.rs

//! URL canonicalization and filtering for the feed's own domain.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use url::Url;
use url::form_urlencoded::Serializer;

/// Canonical origin every feed-domain variant is rewritten to.
pub const CANONICAL_HOST: &str = "http://www.reddit.com";

/// Scheme and host of the feed domain, including locale, mobile, beta,
/// payment and SSL-only subdomains. `end` holds the character after the host,
/// so `reddit.com.example` and `reddit.company.com` do not match.
static FEED_HOST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^https?://(?:(?:[A-Za-z]{2}(?:-[A-Za-z]{2})?|beta|i|m|pay|ssl|www)\.)?reddit\.com(?P<end>[/:?#]|$)",
    )
    .expect("feed host pattern")
});

/// A community or user mention written without a host.
static PLAIN_MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/?(?:u|user|r)/[^/]+/?$").expect("plain mention pattern"));

/// A path that is nothing but a community or user reference.
static BARE_MENTION_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/(?:u|user|r)/[^/]+/?$").expect("mention path pattern"));

/// Whether the URL points at the feed domain.
pub fn is_feed_url(url: &str) -> bool {
    FEED_HOST.is_match(url)
}

/// Rewrite feed-domain variants and bare mentions to the canonical host.
///
/// # Examples
/// ```
/// use snapshill::utils::url::normalize;
///
/// assert_eq!(normalize("https://m.reddit.com/r/rust/comments/x"), "http://www.reddit.com/r/rust/comments/x");
/// assert_eq!(normalize("/u/spez"), "http://www.reddit.com/u/spez");
/// ```
pub fn normalize(url: &str) -> String {
    if PLAIN_MENTION.is_match(url) {
        return format!("{CANONICAL_HOST}/{}", url.trim_start_matches('/'));
    }
    replace_feed_host(url, CANONICAL_HOST)
}

/// Replace the feed-domain origin of `url` with `host`; other URLs are returned as-is.
pub fn replace_feed_host(url: &str, host: &str) -> String {
    FEED_HOST
        .replace(url, |caps: &Captures| format!("{host}{}", &caps["end"]))
        .into_owned()
}

/// Bare community/user links on the feed domain are not worth archiving.
pub fn should_skip(url: &str) -> bool {
    if !is_feed_url(url) {
        return false;
    }
    Url::parse(url)
        .map(|parsed| BARE_MENTION_PATH.is_match(parsed.path()))
        .unwrap_or(false)
}

/// Append form-encoded query pairs to `base`.
pub fn with_query(base: &str, pairs: &[(&str, &str)]) -> String {
    let mut query = Serializer::new(String::new());
    for (key, value) in pairs {
        query.append_pair(key, value);
    }
    format!("{base}?{}", query.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_host_variants() {
        for url in [
            "http://reddit.com/r/test/comments/1",
            "https://www.reddit.com/r/test/comments/1",
            "https://de.reddit.com/r/test/comments/1",
            "https://en-gb.reddit.com/r/test/comments/1",
            "https://m.reddit.com/r/test/comments/1",
            "https://beta.reddit.com/r/test/comments/1",
            "https://pay.reddit.com/r/test/comments/1",
            "https://ssl.reddit.com/r/test/comments/1",
        ] {
            assert_eq!(
                normalize(url),
                "http://www.reddit.com/r/test/comments/1",
                "{url}"
            );
        }
    }

    #[test]
    fn test_normalize_plain_mentions() {
        assert_eq!(normalize("r/test"), "http://www.reddit.com/r/test");
        assert_eq!(normalize("/r/test/"), "http://www.reddit.com/r/test/");
        assert_eq!(normalize("/user/someone"), "http://www.reddit.com/user/someone");
    }

    #[test]
    fn test_normalize_leaves_other_urls() {
        assert_eq!(normalize("https://example.com/a?b=c"), "https://example.com/a?b=c");
        assert_eq!(normalize("https://notreddit.com/r/x"), "https://notreddit.com/r/x");
        assert_eq!(
            normalize("https://reddit.company.com/page"),
            "https://reddit.company.com/page"
        );
        assert_eq!(
            normalize("https://www.reddit.com.evil.example/r/test/comments/a"),
            "https://www.reddit.com.evil.example/r/test/comments/a"
        );
        assert_eq!(normalize("not a url"), "not a url");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for url in [
            "http://reddit.com/r/test",
            "https://m.reddit.com/r/test/comments/abc/title/",
            "/u/someone",
            "r/test/",
            "https://example.com/page",
            "garbage",
            "https://www.reddit.com/",
        ] {
            let once = normalize(url);
            assert_eq!(normalize(&once), once, "{url}");
        }
    }

    #[test]
    fn test_should_skip_bare_mentions() {
        for url in [
            "http://www.reddit.com/r/test",
            "http://www.reddit.com/r/test/",
            "http://www.reddit.com/u/someone",
            "http://www.reddit.com/user/someone/",
        ] {
            assert!(should_skip(url), "{url}");
        }
    }

    #[test]
    fn test_should_not_skip_deep_links() {
        for url in [
            "http://www.reddit.com/r/test/comments/abc",
            "http://www.reddit.com/r/test/wiki",
            "http://www.reddit.com/user/someone/submitted/",
            "https://example.com/r/test",
            "http://www.reddit.com/",
            "https://reddit.company.com/r/x",
            "https://www.reddit.com.evil.example/u/someone",
        ] {
            assert!(!should_skip(url), "{url}");
        }
    }

    #[test]
    fn test_feed_url_requires_exact_host() {
        assert!(is_feed_url("https://www.reddit.com/r/test"));
        assert!(is_feed_url("https://reddit.com"));
        assert!(is_feed_url("https://reddit.com:443/r/test"));
        assert!(is_feed_url("https://reddit.com?x=1"));
        assert!(!is_feed_url("https://reddit.company.com/page"));
        assert!(!is_feed_url("https://www.reddit.com.evil.example/r/test/comments/a"));
        assert!(!is_feed_url("https://m.reddit.community/r/test"));
    }

    #[test]
    fn test_replace_feed_host_keeps_rest() {
        assert_eq!(
            replace_feed_host("https://www.reddit.com/r/a/comments/b", "https://snew.github.io"),
            "https://snew.github.io/r/a/comments/b"
        );
        assert_eq!(
            replace_feed_host("https://reddit.com", "https://snew.github.io"),
            "https://snew.github.io"
        );
    }

    #[test]
    fn test_plain_subreddit_is_normalized_then_skipped() {
        let url = normalize("http://reddit.com/r/test");
        assert_eq!(url, "http://www.reddit.com/r/test");
        assert!(should_skip(&url));
    }

    #[test]
    fn test_with_query_encodes() {
        assert_eq!(
            with_query("https://archive.is/", &[("url", "http://a.com/?x=1&y=2"), ("run", "1")]),
            "https://archive.is/?url=http%3A%2F%2Fa.com%2F%3Fx%3D1%26y%3D2&run=1"
        );
    }
}
