//! Local filesystem storage implementation.
//!
//! The whole record map lives in memory and is rewritten to a single JSON
//! file after each new record (write to temp, then rename).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::error::{AppError, Result};
use crate::storage::NotifiedStore;

/// Local filesystem storage backend.
pub struct LocalStorage {
    path: PathBuf,
    records: RwLock<BTreeMap<String, String>>,
}

impl LocalStorage {
    /// Open the store at `path`, starting empty if the file does not exist yet.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let records = match Self::read_bytes(&path).await? {
            Some(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                AppError::storage(format!("{} is not a valid store: {}", path.display(), e))
            })?,
            None => {
                log::info!("No store at {}, starting empty", path.display());
                BTreeMap::new()
            }
        };
        log::debug!("Loaded {} records from {}", records.len(), path.display());

        Ok(Self {
            path,
            records: RwLock::new(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(path: &Path) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl NotifiedStore for LocalStorage {
    async fn already_notified(&self, item_id: &str) -> Result<bool> {
        Ok(self.records.read().await.contains_key(item_id))
    }

    async fn comment_for(&self, item_id: &str) -> Result<Option<String>> {
        Ok(self.records.read().await.get(item_id).cloned())
    }

    async fn record(&self, item_id: &str, comment_id: &str) -> Result<()> {
        let mut records = self.records.write().await;
        if let Some(existing) = records.get(item_id) {
            log::warn!(
                "{} already recorded with {}, keeping it over {}",
                item_id,
                existing,
                comment_id
            );
            return Ok(());
        }

        records.insert(item_id.to_string(), comment_id.to_string());
        let bytes = serde_json::to_vec_pretty(&*records)?;
        if let Err(e) = self.write_bytes(&bytes).await {
            records.remove(item_id);
            return Err(e);
        }
        Ok(())
    }
}
