// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::{Response, StatusCode};

use crate::error::{AppError, Result};
use crate::models::{ArchiveConfig, RedditConfig};

/// Create the client shared by all archive providers.
pub fn create_archive_client(config: &ArchiveConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Create the client used to talk to the feed API.
pub fn create_feed_client(config: &RedditConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Map a feed response status onto the error taxonomy, passing successes through.
pub fn check_feed_status(response: Response, context: &str) -> Result<Response> {
    match response.status() {
        s if s.is_success() => Ok(response),
        StatusCode::TOO_MANY_REQUESTS => Err(AppError::RateLimited),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AppError::Auth(format!(
            "{context} answered {}",
            response.status()
        ))),
        s => Err(AppError::feed(s.as_u16(), context)),
    }
}
