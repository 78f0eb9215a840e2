//! archive.org Wayback Machine.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};

use super::{ArchiveProvider, Outcome};
use crate::error::{AppError, Result};

/// Timestamp layout used in Wayback snapshot URLs.
const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

pub struct Wayback {
    client: Client,
    base: String,
}

impl Wayback {
    pub fn new(client: Client, base: &str) -> Self {
        Self {
            client,
            base: base.trim_end_matches('/').to_string(),
        }
    }

    /// Snapshot URL for a capture taken at `at`.
    ///
    /// The save endpoint does not report where the capture landed, so this is a
    /// best guess: a save that finishes after `at` lives under a later timestamp.
    /// The Wayback Machine redirects to the nearest capture, which keeps the
    /// guess usable.
    pub fn snapshot_url(&self, at: DateTime<Utc>, url: &str) -> String {
        format!("{}/{}/{}", self.base, at.format(TIMESTAMP_FORMAT), url)
    }
}

#[async_trait]
impl ArchiveProvider for Wayback {
    fn name(&self) -> &str {
        "archive.org"
    }

    fn resubmit_link(&self, url: &str) -> String {
        format!("{}/save/{}", self.base, url)
    }

    async fn archive(&self, url: &str) -> Result<Outcome> {
        let response = self
            .client
            .get(format!("{}/save/{}", self.base, url))
            .send()
            .await?;

        match response.status() {
            // robots.txt exclusion
            StatusCode::FORBIDDEN => Ok(Outcome::NotApplicable),
            s if s.is_success() => Ok(Outcome::Archived(self.snapshot_url(Utc::now(), url))),
            s => Err(AppError::archive(self.name(), format!("save answered {s}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::services::providers::stub::{Reply, serve};

    #[test]
    fn test_snapshot_url_uses_fourteen_digit_timestamp() {
        let wayback = Wayback::new(Client::new(), "https://web.archive.org/");
        let at = Utc.with_ymd_and_hms(2016, 3, 7, 9, 5, 2).unwrap();
        assert_eq!(
            wayback.snapshot_url(at, "http://example.com/a"),
            "https://web.archive.org/20160307090502/http://example.com/a"
        );
    }

    #[test]
    fn test_resubmit_link_is_save_endpoint() {
        let wayback = Wayback::new(Client::new(), "https://web.archive.org");
        assert_eq!(
            wayback.resubmit_link("http://example.com"),
            "https://web.archive.org/save/http://example.com"
        );
    }

    #[tokio::test]
    async fn test_unreachable_service_fails_with_resubmit_link() {
        let wayback = Wayback::new(Client::new(), "http://127.0.0.1:1");
        assert_eq!(
            wayback.submit("http://example.com").await,
            Outcome::Failed {
                resubmit: "http://127.0.0.1:1/save/http://example.com".into()
            }
        );
    }

    #[tokio::test]
    async fn test_robots_exclusion_is_not_applicable() {
        let base = serve(|_| Reply::status(403)).await;
        let wayback = Wayback::new(Client::new(), &base);
        assert_eq!(
            wayback.archive("http://example.com/").await.unwrap(),
            Outcome::NotApplicable
        );
    }

    #[tokio::test]
    async fn test_saved_page_links_timestamped_snapshot() {
        let base = serve(|path| {
            assert_eq!(path, "/save/http://example.com/a");
            Reply::ok("saved")
        })
        .await;
        let wayback = Wayback::new(Client::new(), &base);

        let Outcome::Archived(snapshot) = wayback.archive("http://example.com/a").await.unwrap() else {
            panic!("expected a snapshot");
        };
        let timestamp = snapshot
            .strip_prefix(&format!("{base}/"))
            .and_then(|rest| rest.strip_suffix("/http://example.com/a"))
            .unwrap();
        assert_eq!(timestamp.len(), 14);
        assert!(timestamp.chars().all(|c| c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn test_server_error_fails_with_resubmit_link() {
        let base = serve(|_| Reply::status(500)).await;
        let wayback = Wayback::new(Client::new(), &base);
        assert_eq!(
            wayback.submit("http://example.com").await,
            Outcome::Failed {
                resubmit: format!("{base}/save/http://example.com")
            }
        );
    }
}
