//! Storage of items the bot has already answered.
//!
//! The store maps an item id to the id of the comment posted for it. Records
//! are append-only: once written they are never changed or removed.
//!
//! ```text
//! snapshill.json
//! {
//!   "t3_abc123": "t1_def456",
//!   ...
//! }
//! ```

pub mod local;
pub mod memory;

use async_trait::async_trait;

use crate::error::Result;

// Re-export for convenience
pub use local::LocalStorage;
pub use memory::MemoryStorage;

/// Trait for dedup store backends.
#[async_trait]
pub trait NotifiedStore: Send + Sync {
    /// Whether a comment was already posted for this item.
    async fn already_notified(&self, item_id: &str) -> Result<bool>;

    /// Comment posted for this item, if any.
    async fn comment_for(&self, item_id: &str) -> Result<Option<String>>;

    /// Remember the comment posted for an item.
    ///
    /// An existing record is kept; the new one is ignored.
    async fn record(&self, item_id: &str, comment_id: &str) -> Result<()>;
}
