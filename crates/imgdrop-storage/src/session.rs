//! Session persistence of the accepted collection.
//!
//! Persistence never fails the caller: write and delete errors are logged
//! and dropped, and anything unreadable loads as an empty collection.

use std::sync::Arc;

use imgdrop_core::data_url;
use imgdrop_core::{log_with_level, FileRecord, ObjectUrlRegistry, PersistedRecord};

use crate::traits::{KeyValueStore, StorageError, StorageResult};

#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Persist `records` under `key`. Failures are logged and swallowed.
    pub async fn save(&self, key: &str, records: &[FileRecord]) {
        if let Err(e) = self.try_save(key, records).await {
            log_with_level(&e, "Failed to save session");
        }
    }

    pub async fn try_save(&self, key: &str, records: &[FileRecord]) -> StorageResult<()> {
        let persisted: Vec<PersistedRecord> = records.iter().map(FileRecord::to_persisted).collect();
        let value = serde_json::to_string(&persisted)?;
        self.store.set(key, value).await?;

        tracing::debug!(
            key = %key,
            files = records.len(),
            backend = %self.store.backend_type(),
            "Session saved"
        );
        Ok(())
    }

    /// Restore the collection stored under `key`, minting a fresh access URL
    /// for every record.
    ///
    /// All or nothing: a missing key, an unreadable store, malformed JSON or
    /// any undecodable payload yields an empty collection.
    pub async fn load(&self, key: &str, registry: &Arc<ObjectUrlRegistry>) -> Vec<FileRecord> {
        match self.try_load(key, registry).await {
            Ok(records) => records,
            Err(e) => {
                log_with_level(&e, "Failed to load session");
                Vec::new()
            }
        }
    }

    pub async fn try_load(
        &self,
        key: &str,
        registry: &Arc<ObjectUrlRegistry>,
    ) -> StorageResult<Vec<FileRecord>> {
        let Some(value) = self.store.get(key).await? else {
            return Ok(Vec::new());
        };

        let persisted: Vec<PersistedRecord> = serde_json::from_str(&value)?;

        let mut decoded = Vec::with_capacity(persisted.len());
        for entry in persisted {
            let (_, payload) = data_url::decode(&entry.base64).map_err(|e| {
                StorageError::ReadFailed(format!(
                    "Invalid payload for {}: {}",
                    entry.file.name, e
                ))
            })?;
            decoded.push((entry, payload));
        }

        let records: Vec<FileRecord> = decoded
            .into_iter()
            .map(|(entry, payload)| {
                FileRecord::from_parts(entry.file, entry.base64, payload, registry)
            })
            .collect();

        tracing::debug!(key = %key, files = records.len(), "Session loaded");
        Ok(records)
    }

    /// Remove the persisted collection. Failures are logged and swallowed.
    pub async fn clear(&self, key: &str) {
        match self.store.delete(key).await {
            Ok(()) => tracing::debug!(key = %key, "Session cleared"),
            Err(e) => log_with_level(&e, "Failed to clear session"),
        }
    }
}
