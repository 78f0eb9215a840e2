// src/pipeline/notify.rs

//! Comment rendering and the overflow path for oversized comments.

use crate::error::Result;
use crate::models::{Item, NotifyConfig, Submission};
use crate::services::{FeedClient, LinkArchiver, Outcome};

/// Shown next to a link that resubmits to a failed service.
const RESUBMIT_HINT: &str = "could not auto-archive; click to resubmit it!";

/// How a rendered notification reaches the item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Post the text as a reply.
    Comment(String),
    /// Too long for a comment: post it in the overflow venue and link to it.
    Overflow {
        venue: String,
        title: String,
        body: String,
        backlink: String,
    },
}

/// Overflow posts already made for an item whose delivery did not finish.
///
/// Passed back into [`Notification::deliver`] on retry so the overflow venue
/// gets one submission and one backlink per item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverflowProgress {
    pub submission: Option<Submission>,
    pub backlinked: bool,
}

impl OverflowProgress {
    pub fn is_started(&self) -> bool {
        self.submission.is_some()
    }
}

/// Renders notification text; no I/O.
#[derive(Debug, Clone)]
pub struct Notification {
    config: NotifyConfig,
    overflow_venue: String,
}

impl Notification {
    pub fn new(config: NotifyConfig, overflow_venue: impl Into<String>) -> Self {
        Self {
            config,
            overflow_venue: overflow_venue.into(),
        }
    }

    pub fn footer(&self) -> String {
        format!(
            "*^(I am a bot.) ^\\([*Info*]({}) ^/ ^[*Contact*]({}))*",
            self.config.info_link, self.config.contact_link
        )
    }

    /// Header, snapshot list and footer, separated by blank lines.
    pub fn render(&self, header: &str, archivers: &[LinkArchiver]) -> String {
        let mut parts = Vec::with_capacity(archivers.len() + 3);
        parts.push(header.to_string());
        parts.push("Snapshots:".to_string());
        parts.extend(
            archivers
                .iter()
                .enumerate()
                .map(|(i, archiver)| render_line(i + 1, archiver)),
        );
        parts.push(self.footer());
        parts.join("\n\n")
    }

    /// Decide between a plain reply and the overflow path.
    pub fn plan(&self, text: String, item: &Item) -> Delivery {
        if text.chars().count() <= self.config.comment_limit {
            return Delivery::Comment(text);
        }
        Delivery::Overflow {
            venue: self.overflow_venue.clone(),
            title: format!("Archives for {}", item.permalink),
            body: truncate_chars(&text, self.config.overflow_limit).to_string(),
            backlink: format!(
                "The original submission can be found here:\n\n{}",
                item.permalink
            ),
        }
    }

    /// Reply left on the item when the snapshots went to the overflow venue.
    pub fn overflow_comment(&self, submission_url: &str) -> String {
        format!(
            "Wow, that's a lot of links! The snapshots can be [found here.]({})\n\n{}",
            submission_url,
            self.footer()
        )
    }

    /// Post the notification; returns the id of the comment left on the item.
    ///
    /// Overflow steps already recorded in `progress` are skipped, and each
    /// step that succeeds is recorded there before the next one runs.
    pub async fn deliver(
        &self,
        feed: &dyn FeedClient,
        item: &Item,
        delivery: Delivery,
        progress: &mut OverflowProgress,
    ) -> Result<String> {
        let (venue, title, body, backlink) = match delivery {
            Delivery::Comment(text) => return feed.post_comment(&item.id, &text).await,
            Delivery::Overflow {
                venue,
                title,
                body,
                backlink,
            } => (venue, title, body, backlink),
        };

        let submission = match &progress.submission {
            Some(existing) => {
                log::info!("Reusing overflow submission {} for {}", existing.url, item.id);
                existing.clone()
            }
            None => {
                let created = feed.submit_text(&venue, &title, &body).await?;
                progress.submission = Some(created.clone());
                created
            }
        };

        if !progress.backlinked {
            if let Err(e) = feed.post_comment(&submission.id, &backlink).await {
                log::warn!("Overflow submission {} has no backlink yet: {}", submission.url, e);
                return Err(e);
            }
            progress.backlinked = true;
        }

        match feed
            .post_comment(&item.id, &self.overflow_comment(&submission.url))
            .await
        {
            Ok(comment) => {
                log::info!("Posted a comment and new submission {}", submission.url);
                Ok(comment)
            }
            Err(e) => {
                log::warn!(
                    "Overflow submission {} is not linked from {} yet: {}",
                    submission.url,
                    item.id,
                    e
                );
                Err(e)
            }
        }
    }
}

fn render_line(index: usize, archiver: &LinkArchiver) -> String {
    let link = archiver.link();
    let providers: Vec<String> = archiver
        .attempts()
        .iter()
        .filter_map(|attempt| match attempt.outcome()? {
            Outcome::Archived(url) => Some(format!("[{}]({})", attempt.provider_name(), url)),
            Outcome::Failed { resubmit } => Some(format!(
                "[_{}\\*_]({} \"{}\")",
                attempt.provider_name(),
                resubmit,
                RESUBMIT_HINT
            )),
            Outcome::NotApplicable => None,
        })
        .collect();

    let line = format!("{}. [{}]({})", index, link.text, link.url);
    if providers.is_empty() {
        line
    } else {
        format!("{} - {}", line, providers.join(", "))
    }
}

/// First `max` characters of `text`.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
