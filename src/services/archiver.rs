// src/services/archiver.rs

//! One link and the archive attempts made for it.

use std::sync::Arc;

use crate::models::CandidateLink;
use crate::services::providers::{ArchiveProvider, Outcome, ProviderRegistry};

/// A provider paired with the result of submitting the link to it.
pub struct ArchiveAttempt {
    provider: Arc<dyn ArchiveProvider>,
    outcome: Option<Outcome>,
}

impl ArchiveAttempt {
    fn new(provider: Arc<dyn ArchiveProvider>) -> Self {
        Self {
            provider,
            outcome: None,
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// `None` until the attempt has run.
    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }
}

impl std::fmt::Debug for ArchiveAttempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveAttempt")
            .field("provider", &self.provider.name())
            .field("outcome", &self.outcome)
            .finish()
    }
}

/// A candidate link and its attempts, one per applicable provider.
#[derive(Debug)]
pub struct LinkArchiver {
    link: CandidateLink,
    attempts: Vec<ArchiveAttempt>,
}

impl LinkArchiver {
    /// Pick the providers for this link. Nothing is submitted yet.
    pub fn build(link: CandidateLink, registry: &ProviderRegistry) -> Self {
        log::debug!("Creating archiver for {}", link.url);
        let attempts = registry
            .select(&link.url)
            .into_iter()
            .map(ArchiveAttempt::new)
            .collect();
        Self { link, attempts }
    }

    pub fn link(&self) -> &CandidateLink {
        &self.link
    }

    pub fn attempts(&self) -> &[ArchiveAttempt] {
        &self.attempts
    }

    /// Submit the link to every provider, in order.
    ///
    /// Attempts that already hold an outcome are left alone.
    pub async fn run(&mut self) {
        for attempt in self.attempts.iter_mut().filter(|a| a.outcome.is_none()) {
            let outcome = attempt.provider.submit(&self.link.url).await;
            log::debug!(
                "{} -> {}: {:?}",
                self.link.url,
                attempt.provider.name(),
                outcome
            );
            attempt.outcome = Some(outcome);
        }
    }

    /// Number of providers that produced a snapshot.
    pub fn archived_count(&self) -> usize {
        self.attempts
            .iter()
            .filter(|a| a.outcome.as_ref().is_some_and(Outcome::is_archived))
            .count()
    }
}
