//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Feed account and venues
    #[serde(default)]
    pub reddit: RedditConfig,

    /// Poll loop behavior
    #[serde(default)]
    pub bot: BotConfig,

    /// Archive service endpoints and HTTP settings
    #[serde(default)]
    pub archive: ArchiveConfig,

    /// Comment rendering limits and footer links
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Dedup store location
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Apply the process environment on top of file values.
    pub fn with_env(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a key lookup.
    ///
    /// Unparseable numbers are ignored with a warning.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = lookup("REDDIT_USER") {
            self.reddit.username = v;
        }
        if let Some(v) = lookup("REDDIT_PASS") {
            self.reddit.password = v;
        }
        if let Some(v) = lookup("REDDIT_CLIENT_ID") {
            self.reddit.client_id = v;
        }
        if let Some(v) = lookup("REDDIT_CLIENT_SECRET") {
            self.reddit.client_secret = v;
        }
        if let Some(v) = lookup("DATABASE") {
            self.storage.path = PathBuf::from(v);
        }
        if lookup("DEBUG").as_deref() == Some("true") {
            self.logging.level = "debug".into();
        }

        let number = |key: &str| -> Option<u64> {
            let raw = lookup(key)?;
            raw.trim()
                .parse()
                .map_err(|_| log::warn!("Ignoring {key}={raw:?}: not a number"))
                .ok()
        };
        if let Some(v) = number("LIMIT") {
            self.bot.limit = v as usize;
        }
        if let Some(v) = number("WAIT") {
            self.bot.wait_secs = v;
        }
        if let Some(v) = number("REFRESH") {
            self.bot.refresh_secs = v;
        }
        self
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.reddit.user_agent.trim().is_empty() {
            return Err(AppError::config("reddit.user_agent is empty"));
        }
        if self.reddit.username.trim().is_empty() || self.reddit.password.is_empty() {
            return Err(AppError::config(
                "reddit.username/password missing (set REDDIT_USER and REDDIT_PASS)",
            ));
        }
        if self.reddit.client_id.trim().is_empty() {
            return Err(AppError::config(
                "reddit.client_id missing (set REDDIT_CLIENT_ID)",
            ));
        }
        if self.bot.limit == 0 {
            return Err(AppError::config("bot.limit must be > 0"));
        }
        if self.archive.timeout_secs == 0 {
            return Err(AppError::config("archive.timeout_secs must be > 0"));
        }
        for endpoint in [
            &self.archive.wayback_url,
            &self.archive.megalodon_url,
            &self.archive.archive_is_url,
            &self.archive.mirror_url,
        ] {
            Url::parse(endpoint)?;
        }
        if self.notify.comment_limit == 0 {
            return Err(AppError::config("notify.comment_limit must be > 0"));
        }
        if self.notify.overflow_limit < self.notify.comment_limit {
            return Err(AppError::config(
                "notify.overflow_limit must not be below notify.comment_limit",
            ));
        }
        Ok(())
    }
}

/// Feed account credentials and venues.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditConfig {
    /// User-Agent header for feed requests
    #[serde(default = "defaults::reddit_user_agent")]
    pub user_agent: String,

    /// OAuth application id
    #[serde(default)]
    pub client_id: String,

    /// OAuth application secret
    #[serde(default)]
    pub client_secret: String,

    /// Bot account name
    #[serde(default)]
    pub username: String,

    /// Bot account password
    #[serde(default)]
    pub password: String,

    /// Subreddit whose wiki holds the header texts (`extxt/<scope>`)
    #[serde(default = "defaults::settings_wiki")]
    pub settings_wiki: String,

    /// Subreddit that receives oversized notifications
    #[serde(default = "defaults::overflow_subreddit")]
    pub overflow_subreddit: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::reddit_user_agent(),
            client_id: String::new(),
            client_secret: String::new(),
            username: String::new(),
            password: String::new(),
            settings_wiki: defaults::settings_wiki(),
            overflow_subreddit: defaults::overflow_subreddit(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Poll loop behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Items fetched per cycle
    #[serde(default = "defaults::limit")]
    pub limit: usize,

    /// Sleep between cycles in seconds
    #[serde(default = "defaults::wait")]
    pub wait_secs: u64,

    /// Header and ignore list refresh interval in seconds
    #[serde(default = "defaults::refresh")]
    pub refresh_secs: u64,

    /// Delay before archiving a link on the feed's own domain
    #[serde(default = "defaults::feed_domain_delay")]
    pub feed_domain_delay_ms: u64,

    /// Warn when a single item takes longer than this
    #[serde(default = "defaults::warn_after")]
    pub warn_after_secs: u64,

    /// Per-subreddit header scopes to load in addition to `all`
    #[serde(default)]
    pub header_scopes: Vec<String>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            limit: defaults::limit(),
            wait_secs: defaults::wait(),
            refresh_secs: defaults::refresh(),
            feed_domain_delay_ms: defaults::feed_domain_delay(),
            warn_after_secs: defaults::warn_after(),
            header_scopes: Vec::new(),
        }
    }
}

/// Archive service endpoints and HTTP settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// User-Agent header for archive requests
    #[serde(default = "defaults::archive_user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    #[serde(default = "defaults::wayback_url")]
    pub wayback_url: String,

    #[serde(default = "defaults::megalodon_url")]
    pub megalodon_url: String,

    #[serde(default = "defaults::archive_is_url")]
    pub archive_is_url: String,

    /// Host that mirrors reddit threads without a network call
    #[serde(default = "defaults::mirror_url")]
    pub mirror_url: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::archive_user_agent(),
            timeout_secs: defaults::timeout(),
            wayback_url: defaults::wayback_url(),
            megalodon_url: defaults::megalodon_url(),
            archive_is_url: defaults::archive_is_url(),
            mirror_url: defaults::mirror_url(),
        }
    }
}

/// Comment rendering limits and footer links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Longest comment posted directly, in characters
    #[serde(default = "defaults::comment_limit")]
    pub comment_limit: usize,

    /// Longest overflow submission body, in characters
    #[serde(default = "defaults::overflow_limit")]
    pub overflow_limit: usize,

    #[serde(default = "defaults::info_link")]
    pub info_link: String,

    #[serde(default = "defaults::contact_link")]
    pub contact_link: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            comment_limit: defaults::comment_limit(),
            overflow_limit: defaults::overflow_limit(),
            info_link: defaults::info_link(),
            contact_link: defaults::contact_link(),
        }
    }
}

/// Dedup store location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "defaults::storage_path")]
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: defaults::storage_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Feed defaults
    pub fn reddit_user_agent() -> String {
        "Archives to archive.is and archive.org (/r/SnapshillBot) v1.3".into()
    }
    pub fn settings_wiki() -> String {
        "SnapshillBot".into()
    }
    pub fn overflow_subreddit() -> String {
        "SnapshillBotEx".into()
    }
    pub fn timeout() -> u64 {
        60
    }

    // Loop defaults
    pub fn limit() -> usize {
        25
    }
    pub fn wait() -> u64 {
        5
    }
    pub fn refresh() -> u64 {
        1800
    }
    pub fn feed_domain_delay() -> u64 {
        2000
    }
    pub fn warn_after() -> u64 {
        300
    }

    // Archive defaults
    pub fn archive_user_agent() -> String {
        "Mozilla/5.0 (compatible; snapshill/0.1; +https://www.reddit.com/r/SnapshillBot)".into()
    }
    pub fn wayback_url() -> String {
        "https://web.archive.org".into()
    }
    pub fn megalodon_url() -> String {
        "http://megalodon.jp/pc/get_simple/decide".into()
    }
    pub fn archive_is_url() -> String {
        "https://archive.is".into()
    }
    pub fn mirror_url() -> String {
        "https://snew.github.io".into()
    }

    // Notification defaults
    pub fn comment_limit() -> usize {
        9999
    }
    pub fn overflow_limit() -> usize {
        39999
    }
    pub fn info_link() -> String {
        "/r/SnapshillBot".into()
    }
    pub fn contact_link() -> String {
        r"/message/compose?to=\/r\/SnapshillBot".into()
    }

    pub fn storage_path() -> PathBuf {
        PathBuf::from("snapshill.json")
    }
    pub fn log_level() -> String {
        "info".into()
    }
}
