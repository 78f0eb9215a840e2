// src/error.rs

//! Unified error handling for the bot.

use std::fmt;

use thiserror::Error;

/// Result type alias for bot operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Feed endpoint answered with a non-success status
    #[error("Feed error ({status}) for {context}")]
    Feed { status: u16, context: String },

    /// Feed API accepted the request but reported errors in its payload
    #[error("Feed API rejected {context}: {message}")]
    Api { context: String, message: String },

    /// Feed credentials were refused or the token expired mid-request
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Feed rate limit hit
    #[error("Rate limited by feed")]
    RateLimited,

    /// Archive service replied with something we cannot use
    #[error("Archive error for {provider}: {message}")]
    Archive { provider: String, message: String },

    /// Dedup store is unusable
    #[error("Storage error: {0}")]
    Storage(String),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a feed status error with context.
    pub fn feed(status: u16, context: impl Into<String>) -> Self {
        Self::Feed {
            status,
            context: context.into(),
        }
    }

    /// Create a feed API payload error.
    pub fn api(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Api {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create an archive service error.
    pub fn archive(provider: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Archive {
            provider: provider.into(),
            message: message.to_string(),
        }
    }

    /// Create a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Whether the poll loop may log this error and carry on with the next cycle.
    ///
    /// Everything else is fatal and ends the process.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Http(_)
                | Self::Feed { .. }
                | Self::Api { .. }
                | Self::Auth(_)
                | Self::RateLimited
                | Self::Archive { .. }
        )
    }

    /// Network-level failures: timeouts, refused connections, bad statuses.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Archive { .. })
    }
}
