// src/services/extract.rs

//! Link extraction from self post bodies.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use url::Url;

use crate::utils::resolve_url;
use crate::utils::url::CANONICAL_HOST;

static ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("anchor selector"));

/// Relative hrefs in a post body are relative to the feed's own site.
static BASE: LazyLock<Url> = LazyLock::new(|| {
    Url::parse(&format!("{CANONICAL_HOST}/")).expect("canonical host is a valid URL")
});

/// Collect `(url, text)` for each anchor in an entity-escaped HTML body.
///
/// Anchors keep document order. Non-web schemes (`mailto:`, `javascript:`)
/// are dropped and empty anchor text falls back to the URL.
pub fn extract_links(escaped_html: &str) -> Vec<(String, String)> {
    let html = unescape(escaped_html);
    let document = Html::parse_fragment(&html);

    document
        .select(&ANCHOR)
        .filter_map(|anchor| {
            let href = anchor.value().attr("href")?.trim();
            let url = resolve_url(&BASE, href);
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return None;
            }

            let text = anchor.text().collect::<String>();
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            let text = if text.is_empty() { url.clone() } else { text };
            Some((url, text))
        })
        .collect()
}

/// The feed serves body HTML with its markup entity-escaped; parsing it once
/// as a fragment and reading the text back yields the real markup.
fn unescape(escaped: &str) -> String {
    Html::parse_fragment(escaped)
        .root_element()
        .text()
        .collect()
}
