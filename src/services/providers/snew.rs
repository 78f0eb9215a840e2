//! snew.github.io, a reddit front end that shows removed comments.

use async_trait::async_trait;

use super::{ArchiveProvider, Outcome};
use crate::error::Result;
use crate::utils::url::replace_feed_host;

/// Rewrites a feed URL onto the mirror host. No request is made.
pub struct Snew {
    host: String,
}

impl Snew {
    pub fn new(host: &str) -> Self {
        Self {
            host: host.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ArchiveProvider for Snew {
    fn name(&self) -> &str {
        "snew.github.io"
    }

    fn resubmit_link(&self, url: &str) -> String {
        replace_feed_host(url, &self.host)
    }

    async fn archive(&self, url: &str) -> Result<Outcome> {
        Ok(Outcome::Archived(replace_feed_host(url, &self.host)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rewrites_feed_host() {
        let snew = Snew::new("https://snew.github.io/");
        assert_eq!(
            snew.submit("http://www.reddit.com/r/test/comments/abc/title/").await,
            Outcome::Archived("https://snew.github.io/r/test/comments/abc/title/".into())
        );
    }
}
