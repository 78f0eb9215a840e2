//! archive.is (archive.today).

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;

use super::{ArchiveProvider, Outcome};
use crate::error::{AppError, Result};
use crate::utils::url::with_query;

/// Shape of a capture link; the submit page mentions it in a script redirect.
static CAPTURE_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://archive\.is/[0-z]{1,6}").expect("capture link pattern"));

pub struct ArchiveIs {
    client: Client,
    base: String,
}

impl ArchiveIs {
    pub fn new(client: Client, base: &str) -> Self {
        Self {
            client,
            base: base.trim_end_matches('/').to_string(),
        }
    }

    /// First capture link mentioned in a submission response.
    pub fn find_capture(body: &str) -> Option<&str> {
        CAPTURE_LINK.find(body).map(|m| m.as_str())
    }
}

#[async_trait]
impl ArchiveProvider for ArchiveIs {
    fn name(&self) -> &str {
        "archive.is"
    }

    fn resubmit_link(&self, url: &str) -> String {
        with_query(&format!("{}/", self.base), &[("url", url), ("run", "1")])
    }

    async fn archive(&self, url: &str) -> Result<Outcome> {
        let response = self
            .client
            .post(format!("{}/submit/", self.base))
            .form(&[("url", url)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::archive(
                self.name(),
                format!("submission answered {}", response.status()),
            ));
        }

        let body = response.text().await?;
        match Self::find_capture(&body) {
            Some(capture) => Ok(Outcome::Archived(capture.to_string())),
            None => {
                log::debug!("archive.is response for {} held no capture link", url);
                Ok(self.failed(url))
            }
        }
    }
}
