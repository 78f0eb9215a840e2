// src/models/mod.rs

//! Domain models for the bot.

mod config;
mod item;

// Re-export all public types
pub use config::{
    ArchiveConfig, BotConfig, Config, LoggingConfig, NotifyConfig, RedditConfig, StorageConfig,
};
pub use item::{CandidateLink, DISPLAY_TEXT_MAX, Item, Submission};
