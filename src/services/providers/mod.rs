// src/services/providers/mod.rs

//! Archive services a link can be submitted to.
//!
//! Every provider answers with an [`Outcome`]. Transport and protocol errors
//! are caught in [`ArchiveProvider::submit`] so one misbehaving service never
//! costs the others their results.

mod archive_is;
mod megalodon;
mod snew;
#[cfg(test)]
mod stub;
mod wayback;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::ArchiveConfig;
use crate::utils::url::is_feed_url;

pub use archive_is::ArchiveIs;
pub use megalodon::Megalodon;
pub use snew::Snew;
pub use wayback::Wayback;

/// Result of submitting one URL to one service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The snapshot lives at this URL.
    Archived(String),
    /// The service could not archive the page; the link lets a reader retry by hand.
    Failed { resubmit: String },
    /// The service refuses this page outright (robots policy).
    NotApplicable,
}

impl Outcome {
    pub fn is_archived(&self) -> bool {
        matches!(self, Self::Archived(_))
    }
}

#[async_trait]
pub trait ArchiveProvider: Send + Sync {
    /// Display name used in notifications.
    fn name(&self) -> &str;

    /// Link a reader can follow to submit `url` manually.
    fn resubmit_link(&self, url: &str) -> String;

    /// Perform the service's submission protocol.
    async fn archive(&self, url: &str) -> Result<Outcome>;

    /// Submit `url`, turning every error into [`Outcome::Failed`].
    async fn submit(&self, url: &str) -> Outcome {
        match self.archive(url).await {
            Ok(outcome) => outcome,
            Err(e) => {
                if e.is_transport() {
                    log::debug!("{} could not archive {}: {}", self.name(), url, e);
                } else {
                    log::error!("Unexpected error from {} archiving {}: {:?}", self.name(), url, e);
                }
                self.failed(url)
            }
        }
    }

    fn failed(&self, url: &str) -> Outcome {
        Outcome::Failed {
            resubmit: self.resubmit_link(url),
        }
    }
}

type Applies = Box<dyn Fn(&str) -> bool + Send + Sync>;

struct RegistryEntry {
    applies: Applies,
    provider: Arc<dyn ArchiveProvider>,
}

/// Ordered providers, each guarded by a predicate deciding whether it handles a URL.
#[derive(Default)]
pub struct ProviderRegistry {
    entries: Vec<RegistryEntry>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stock provider set.
    ///
    /// Order matters: archive.is is the slowest and flakiest, so it runs last.
    pub fn standard(client: reqwest::Client, config: &ArchiveConfig) -> Self {
        Self::new()
            .always(Wayback::new(client.clone(), &config.wayback_url))
            .always(Megalodon::new(client.clone(), &config.megalodon_url))
            .when(is_feed_url, Snew::new(&config.mirror_url))
            .always(ArchiveIs::new(client, &config.archive_is_url))
    }

    /// Register a provider for every URL.
    pub fn always(self, provider: impl ArchiveProvider + 'static) -> Self {
        self.when(|_| true, provider)
    }

    /// Register a provider for URLs matching `applies`.
    pub fn when(
        mut self,
        applies: impl Fn(&str) -> bool + Send + Sync + 'static,
        provider: impl ArchiveProvider + 'static,
    ) -> Self {
        self.entries.push(RegistryEntry {
            applies: Box::new(applies),
            provider: Arc::new(provider),
        });
        self
    }

    /// Providers handling `url`, in registration order.
    pub fn select(&self, url: &str) -> Vec<Arc<dyn ArchiveProvider>> {
        self.entries
            .iter()
            .filter(|entry| (entry.applies)(url))
            .map(|entry| Arc::clone(&entry.provider))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
