//! Pipeline entry points for the bot.
//!
//! - `connect`: Log in and wire feed, store and archive services together
//! - `Snapshill::run_cycle`: One pass over the newest items
//! - `Runner`: The poll loop

pub mod cycle;
pub mod notify;
pub mod runner;

use std::sync::Arc;

use crate::error::Result;
use crate::models::Config;
use crate::services::{ProviderRegistry, RedditClient};
use crate::storage::LocalStorage;
use crate::utils::http;

pub use cycle::{CycleReport, Snapshill, candidate_links};
pub use notify::{Delivery, Notification, OverflowProgress};
pub use runner::Runner;

/// Build a logged-in bot from configuration.
pub async fn connect(config: &Config) -> Result<Snapshill> {
    let reddit = Arc::new(RedditClient::new(config.reddit.clone())?);
    reddit.login().await?;
    log::info!("Logged in as {}", config.reddit.username);

    let store = Arc::new(LocalStorage::open(&config.storage.path).await?);
    log::info!(
        "Using store {} ({} items)",
        store.path().display(),
        store.len().await
    );

    let client = http::create_archive_client(&config.archive)?;
    let registry = ProviderRegistry::standard(client, &config.archive);
    let notification = Notification::new(
        config.notify.clone(),
        config.reddit.overflow_subreddit.clone(),
    );

    Ok(Snapshill::new(
        reddit.clone(),
        reddit,
        store,
        registry,
        notification,
        config.bot.clone(),
    ))
}
