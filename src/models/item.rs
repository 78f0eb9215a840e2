//! Feed items and the links found inside them.

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Longest display text shown for a link before it is cut.
pub const DISPLAY_TEXT_MAX: usize = 35;

/// Marker appended to cut display text.
const ELLIPSIS: &str = "...";

/// A submission polled from the feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    /// Stable fullname, e.g. `t3_abc123`
    pub id: String,

    /// Absolute URL of the submission's comment page
    pub permalink: String,

    /// Target of a link post, or the permalink of a self post
    pub url: String,

    /// Community the item was posted in
    pub subreddit: String,

    pub author: String,

    /// Text post rather than a link post
    pub is_self: bool,

    /// Entity-escaped HTML body of a self post
    #[serde(default)]
    pub selftext_html: Option<String>,
}

/// A submission created by the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub id: String,
    pub url: String,
}

/// A URL admitted for archiving, with the short text shown next to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateLink {
    pub url: String,
    pub text: String,
}

impl CandidateLink {
    /// Create a link, cutting the display text to at most [`DISPLAY_TEXT_MAX`] characters.
    pub fn new(url: impl Into<String>, text: &str) -> Self {
        Self {
            url: url.into(),
            text: shorten(text),
        }
    }
}

/// Cut on grapheme boundaries, so an accent is never split from its letter,
/// while the head stays within the character limit.
fn shorten(text: &str) -> String {
    if text.chars().count() <= DISPLAY_TEXT_MAX {
        return text.to_string();
    }

    let mut head = String::new();
    let mut used = 0;
    for grapheme in text.graphemes(true) {
        let width = grapheme.chars().count();
        if used + width > DISPLAY_TEXT_MAX {
            break;
        }
        head.push_str(grapheme);
        used += width;
    }
    format!("{head}{ELLIPSIS}")
}
