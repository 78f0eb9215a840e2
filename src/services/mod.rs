//! Service layer for the bot.
//!
//! This module contains the business logic for:
//! - Archive services (`providers`) and per-link archiving (`LinkArchiver`)
//! - Link extraction from post bodies (`extract_links`)
//! - Header rotation (`HeaderRotator`)
//! - Feed access (`FeedClient`, `RedditClient`)

mod archiver;
mod extract;
pub mod headers;
pub mod providers;
pub mod reddit;

pub use archiver::{ArchiveAttempt, LinkArchiver};
pub use extract::extract_links;
pub use headers::{Header, HeaderRotator, HeaderSource};
pub use providers::{ArchiveProvider, Outcome, ProviderRegistry};
pub use reddit::{FeedClient, RedditClient};
