use crate::{KeyValueStore, LocalStore, MemoryStore, StorageError, StorageResult, StoreBackend};
use imgdrop_core::StoreConfig;
use std::sync::Arc;

/// Create a key-value store based on configuration
pub async fn create_store(config: &StoreConfig) -> StorageResult<Arc<dyn KeyValueStore>> {
    match config.backend {
        StoreBackend::Memory => {
            let store = match config.memory_quota_bytes {
                Some(quota) => MemoryStore::with_quota(quota),
                None => MemoryStore::new(),
            };
            tracing::debug!(quota = ?config.memory_quota_bytes, "Using memory store");
            Ok(Arc::new(store))
        }

        StoreBackend::Local => {
            let path = config.local_path.clone().ok_or_else(|| {
                StorageError::ConfigError("IMGDROP_STORE_PATH not configured".to_string())
            })?;
            tracing::debug!(path = %path.display(), "Using local store");
            let store = LocalStore::new(path).await?;
            Ok(Arc::new(store))
        }
    }
}
