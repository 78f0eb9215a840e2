// src/pipeline/cycle.rs

//! One polling cycle: fetch, filter, archive, notify, record.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::error::Result;
use crate::models::{BotConfig, CandidateLink, Item};
use crate::services::{
    FeedClient, HeaderRotator, HeaderSource, LinkArchiver, ProviderRegistry, extract_links,
};
use crate::storage::NotifiedStore;
use crate::utils::url::{is_feed_url, normalize, should_skip};

use super::notify::{Notification, OverflowProgress};

/// Display text for the item's own target.
const THIS_POST: &str = "*This Post*";

/// Counters for a finished cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub fetched: usize,
    pub skipped: usize,
    pub notified: usize,
    pub failed: usize,
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} fetched, {} notified, {} skipped, {} failed",
            self.fetched, self.notified, self.skipped, self.failed
        )
    }
}

/// What happened to one item.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ItemResult {
    Skipped(&'static str),
    Notified(String),
    Failed,
}

/// The bot: feed, store and providers wired together.
pub struct Snapshill {
    feed: Arc<dyn FeedClient>,
    header_source: Arc<dyn HeaderSource>,
    store: Arc<dyn NotifiedStore>,
    registry: ProviderRegistry,
    notification: Notification,
    headers: HeaderRotator,
    ignored: HashSet<String>,
    /// Unfinished overflow deliveries by item id.
    overflow: Mutex<HashMap<String, OverflowProgress>>,
    config: BotConfig,
}

impl Snapshill {
    pub fn new(
        feed: Arc<dyn FeedClient>,
        header_source: Arc<dyn HeaderSource>,
        store: Arc<dyn NotifiedStore>,
        registry: ProviderRegistry,
        notification: Notification,
        config: BotConfig,
    ) -> Self {
        Self {
            feed,
            header_source,
            store,
            registry,
            notification,
            headers: HeaderRotator::new(),
            ignored: HashSet::new(),
            overflow: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Reload header texts and the ignore list.
    ///
    /// A failed ignore list fetch keeps the previous list.
    pub async fn refresh(&mut self) {
        self.headers
            .refresh_all(self.header_source.as_ref(), &self.config.header_scopes)
            .await;

        match self.feed.ignored_authors().await {
            Ok(names) => {
                self.ignored = names.into_iter().map(|n| n.to_lowercase()).collect();
                log::debug!("Ignoring {} accounts", self.ignored.len());
            }
            Err(e) => log::warn!("Could not refresh ignore list: {}", e),
        }
    }

    /// Drop refreshed state.
    pub fn quit(&mut self) {
        self.headers.clear();
        self.ignored.clear();
    }

    /// Process every new item once, in fetch order.
    ///
    /// Errors fetching the feed abort the cycle. A failed post only skips
    /// its item, which stays unrecorded and is retried next cycle.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let items = self.feed.fetch_new_items(self.config.limit).await?;
        let mut report = CycleReport {
            fetched: items.len(),
            ..CycleReport::default()
        };

        for item in &items {
            log::debug!("Found submission {}", item.permalink);
            let started = Instant::now();

            match self.process(item).await? {
                ItemResult::Skipped(reason) => {
                    log::debug!("Skipping {}: {}", item.id, reason);
                    report.skipped += 1;
                }
                ItemResult::Notified(comment) => {
                    log::info!("Notified {} with {}", item.id, comment);
                    report.notified += 1;
                }
                ItemResult::Failed => report.failed += 1,
            }

            let elapsed = started.elapsed();
            if elapsed > Duration::from_secs(self.config.warn_after_secs) {
                log::warn!(
                    "Spent {}s on {}",
                    elapsed.as_secs(),
                    item.permalink
                );
            }
        }
        Ok(report)
    }

    async fn process(&self, item: &Item) -> Result<ItemResult> {
        if self.ignored.contains(&item.author.to_lowercase()) {
            return Ok(ItemResult::Skipped("ignored author"));
        }
        if self.store.already_notified(&item.id).await? {
            return Ok(ItemResult::Skipped("already notified"));
        }
        let Some(links) = candidate_links(item) else {
            return Ok(ItemResult::Skipped("no links"));
        };

        let mut archivers = Vec::with_capacity(links.len());
        for link in links {
            if is_feed_url(&link.url) && self.config.feed_domain_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.feed_domain_delay_ms)).await;
            }
            let mut archiver = LinkArchiver::build(link, &self.registry);
            archiver.run().await;
            log::debug!(
                "{}: {}/{} snapshots",
                archiver.link().url,
                archiver.archived_count(),
                archiver.attempts().len()
            );
            archivers.push(archiver);
        }

        let header = self.headers.get(&item.subreddit);
        let text = self.notification.render(&header, &archivers);
        let delivery = self.notification.plan(text, item);

        let mut progress = self
            .overflow
            .lock()
            .await
            .remove(&item.id)
            .unwrap_or_default();
        let delivered = self
            .notification
            .deliver(self.feed.as_ref(), item, delivery, &mut progress)
            .await;
        if delivered.is_err() && progress.is_started() {
            self.overflow.lock().await.insert(item.id.clone(), progress);
        }

        match delivered {
            Ok(comment) => {
                self.store.record(&item.id, &comment).await?;
                Ok(ItemResult::Notified(comment))
            }
            Err(e) if e.is_recoverable() => {
                log::error!("Could not notify {}: {:?}", item.id, e);
                Ok(ItemResult::Failed)
            }
            Err(e) => Err(e),
        }
    }
}

/// Links worth archiving for an item, its own target first.
///
/// `None` when there is nothing to archive, including self posts whose body
/// links nowhere.
pub fn candidate_links(item: &Item) -> Option<Vec<CandidateLink>> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    let own = normalize(&item.url);
    if !should_skip(&own) {
        seen.insert(own.clone());
        links.push(CandidateLink::new(own, THIS_POST));
    }

    if item.is_self {
        if let Some(body) = &item.selftext_html {
            let found = extract_links(body);
            if found.is_empty() {
                return None;
            }
            for (url, text) in found {
                log::debug!("Found link in text post: {}", url);
                let url = normalize(&url);
                if should_skip(&url) || !seen.insert(url.clone()) {
                    continue;
                }
                links.push(CandidateLink::new(url, &text));
            }
        }
    }

    (!links.is_empty()).then_some(links)
}
