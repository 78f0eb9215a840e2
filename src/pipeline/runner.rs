// src/pipeline/runner.rs

//! The poll loop around [`Snapshill::run_cycle`].

use std::future::Future;
use std::time::{Duration, Instant};

use crate::error::Result;
use crate::models::BotConfig;

use super::cycle::Snapshill;

pub struct Runner {
    bot: Snapshill,
    wait: Duration,
    refresh_every: Duration,
}

impl Runner {
    pub fn new(bot: Snapshill, config: &BotConfig) -> Self {
        Self {
            bot,
            wait: Duration::from_secs(config.wait_secs),
            refresh_every: Duration::from_secs(config.refresh_secs),
        }
    }

    /// Poll until interrupted with Ctrl-C.
    pub async fn run(self) -> Result<()> {
        self.run_until(tokio::signal::ctrl_c()).await
    }

    /// Poll until `shutdown` completes or a fatal error occurs.
    ///
    /// Recoverable errors abort only the current cycle.
    pub async fn run_until<F: Future>(mut self, shutdown: F) -> Result<()> {
        tokio::pin!(shutdown);

        self.bot.refresh().await;
        let mut refreshed_at = Instant::now();

        loop {
            log::debug!("Running");
            match self.bot.run_cycle().await {
                Ok(report) => log::info!("Cycle done: {}", report),
                Err(e) if e.is_recoverable() => log::error!("Cycle aborted: {:?}", e),
                Err(e) => {
                    log::error!("Fatal error, stopping: {:?}", e);
                    self.bot.quit();
                    return Err(e);
                }
            }

            if refreshed_at.elapsed() >= self.refresh_every {
                log::info!("Reloading header text and ignore list...");
                self.bot.refresh().await;
                refreshed_at = Instant::now();
            }

            tokio::select! {
                _ = tokio::time::sleep(self.wait) => {}
                _ = &mut shutdown => {
                    log::info!("Shutting down");
                    break;
                }
            }
        }

        self.bot.quit();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;
    use crate::error::AppError;
    use crate::models::{Item, NotifyConfig, Submission};
    use crate::pipeline::notify::Notification;
    use crate::services::{FeedClient, HeaderSource, ProviderRegistry};
    use crate::storage::MemoryStorage;

    /// Feed whose every fetch fails with the error built by `fail`.
    struct FailingFeed {
        fetches: AtomicUsize,
        refreshes: AtomicUsize,
        fail: fn() -> AppError,
        stop_after: usize,
        stop: Notify,
    }

    #[async_trait]
    impl FeedClient for FailingFeed {
        async fn fetch_new_items(&self, _limit: usize) -> Result<Vec<Item>> {
            if self.fetches.fetch_add(1, Ordering::SeqCst) + 1 == self.stop_after {
                self.stop.notify_one();
            }
            Err((self.fail)())
        }

        async fn post_comment(&self, _parent_id: &str, _text: &str) -> Result<String> {
            unreachable!("nothing is fetched")
        }

        async fn submit_text(&self, _venue: &str, _title: &str, _text: &str) -> Result<Submission> {
            unreachable!("nothing is fetched")
        }

        async fn ignored_authors(&self) -> Result<Vec<String>> {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    #[async_trait]
    impl HeaderSource for FailingFeed {
        async fn fetch_header(&self, _scope: &str) -> Result<Option<String>> {
            Ok(None)
        }
    }

    fn runner(feed: Arc<FailingFeed>, config: &BotConfig) -> Runner {
        let bot = Snapshill::new(
            feed.clone(),
            feed,
            Arc::new(MemoryStorage::new()),
            ProviderRegistry::new(),
            Notification::new(NotifyConfig::default(), "SnapshillBotEx"),
            config.clone(),
        );
        Runner::new(bot, config)
    }

    fn feed(fail: fn() -> AppError) -> Arc<FailingFeed> {
        Arc::new(FailingFeed {
            fetches: AtomicUsize::new(0),
            refreshes: AtomicUsize::new(0),
            fail,
            stop_after: 3,
            stop: Notify::new(),
        })
    }

    #[tokio::test]
    async fn test_fatal_error_stops_loop() {
        let feed = feed(|| AppError::storage("disk gone"));
        let result = runner(feed.clone(), &BotConfig::default())
            .run_until(std::future::pending::<()>())
            .await;

        assert!(matches!(result, Err(AppError::Storage(_))));
        assert_eq!(feed.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_recoverable_errors_keep_polling() {
        let feed = feed(|| AppError::feed(503, "fetch new"));
        let config = BotConfig {
            wait_secs: 0,
            refresh_secs: 0,
            ..BotConfig::default()
        };
        let result = runner(feed.clone(), &config)
            .run_until(feed.stop.notified())
            .await;

        assert!(result.is_ok());
        let fetches = feed.fetches.load(Ordering::SeqCst);
        assert!(fetches >= 3, "polled {fetches} times");
        assert!(feed.refreshes.load(Ordering::SeqCst) >= 3);
    }
}
