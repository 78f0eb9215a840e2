//! In-memory store, for dry runs and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::storage::NotifiedStore;

#[derive(Debug, Default)]
pub struct MemoryStorage {
    records: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotifiedStore for MemoryStorage {
    async fn already_notified(&self, item_id: &str) -> Result<bool> {
        Ok(self.records.read().await.contains_key(item_id))
    }

    async fn comment_for(&self, item_id: &str) -> Result<Option<String>> {
        Ok(self.records.read().await.get(item_id).cloned())
    }

    async fn record(&self, item_id: &str, comment_id: &str) -> Result<()> {
        self.records
            .write()
            .await
            .entry(item_id.to_string())
            .or_insert_with(|| comment_id.to_string());
        Ok(())
    }
}
