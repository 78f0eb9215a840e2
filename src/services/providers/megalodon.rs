//! megalodon.jp, a Japanese web cache.

use async_trait::async_trait;
use reqwest::Client;

use super::{ArchiveProvider, Outcome};
use crate::error::{AppError, Result};
use crate::utils::url::with_query;

/// The service answers a submission with a redirect to the capture; the
/// capture URL cannot be predicted, since a one second skew already breaks it.
pub struct Megalodon {
    client: Client,
    endpoint: String,
}

impl Megalodon {
    pub fn new(client: Client, endpoint: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
        }
    }
}

#[async_trait]
impl ArchiveProvider for Megalodon {
    fn name(&self) -> &str {
        "megalodon.jp"
    }

    fn resubmit_link(&self, url: &str) -> String {
        with_query(&self.endpoint, &[("url", url)])
    }

    async fn archive(&self, url: &str) -> Result<Outcome> {
        let response = self
            .client
            .post(&self.endpoint)
            .form(&[("url", url)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::archive(
                self.name(),
                format!("submission answered {}", response.status()),
            ));
        }

        let landed = response.url().as_str();
        if landed.trim_end_matches('/') == self.endpoint.trim_end_matches('/') {
            log::debug!("megalodon.jp did not redirect for {}", url);
            return Ok(self.failed(url));
        }
        Ok(Outcome::Archived(landed.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::stub::{Reply, serve};

    #[test]
    fn test_resubmit_link_encodes_url() {
        let megalodon = Megalodon::new(Client::new(), "http://megalodon.jp/pc/get_simple/decide");
        assert_eq!(
            megalodon.resubmit_link("http://example.com/?a=1"),
            "http://megalodon.jp/pc/get_simple/decide?url=http%3A%2F%2Fexample.com%2F%3Fa%3D1"
        );
    }

    #[tokio::test]
    async fn test_unreachable_service_fails() {
        let megalodon = Megalodon::new(Client::new(), "http://127.0.0.1:1/decide");
        let outcome = megalodon.submit("http://example.com").await;
        assert_eq!(
            outcome,
            Outcome::Failed {
                resubmit: "http://127.0.0.1:1/decide?url=http%3A%2F%2Fexample.com".into()
            }
        );
    }

    #[tokio::test]
    async fn test_redirect_target_is_the_capture() {
        let base = serve(|path| match path {
            "/decide" => Reply::redirect("/pc/get_simple/123"),
            _ => Reply::ok("capture"),
        })
        .await;
        let megalodon = Megalodon::new(Client::new(), &format!("{base}/decide"));
        assert_eq!(
            megalodon.archive("http://example.com").await.unwrap(),
            Outcome::Archived(format!("{base}/pc/get_simple/123"))
        );
    }

    #[tokio::test]
    async fn test_no_redirect_fails() {
        let base = serve(|_| Reply::ok("try again later")).await;
        let endpoint = format!("{base}/decide");
        let megalodon = Megalodon::new(Client::new(), &endpoint);
        assert_eq!(
            megalodon.archive("http://example.com").await.unwrap(),
            Outcome::Failed {
                resubmit: format!("{endpoint}?url=http%3A%2F%2Fexample.com")
            }
        );
    }
}
