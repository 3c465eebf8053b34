//! Key-value store abstraction

use crate::StoreBackend;
use async_trait::async_trait;
use imgdrop_core::{ErrorMetadata, LogLevel};
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage quota exceeded: {needed} bytes needed, {quota} bytes allowed")]
    QuotaExceeded { needed: usize, quota: usize },

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ErrorMetadata for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            StorageError::QuotaExceeded { .. } => "STORAGE_QUOTA_EXCEEDED",
            StorageError::InvalidKey(_) => "INVALID_STORAGE_KEY",
            StorageError::WriteFailed(_) => "STORAGE_WRITE_FAILED",
            StorageError::ReadFailed(_) => "STORAGE_READ_FAILED",
            StorageError::DeleteFailed(_) => "STORAGE_DELETE_FAILED",
            StorageError::Serialization(_) => "STORAGE_SERIALIZATION_FAILED",
            StorageError::IoError(_) => "STORAGE_IO_ERROR",
            StorageError::ConfigError(_) => "STORAGE_CONFIG_ERROR",
        }
    }

    fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            StorageError::InvalidKey(_) | StorageError::ConfigError(_)
        )
    }

    fn log_level(&self) -> LogLevel {
        match self {
            StorageError::ConfigError(_) => LogLevel::Error,
            _ => LogLevel::Warn,
        }
    }

    fn client_message(&self) -> String {
        "Session could not be persisted".to_string()
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A durable string-to-string store
///
/// Every backend keeps one string value per key. Missing keys read as `None`
/// and deleting a missing key succeeds.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: String) -> StorageResult<()>;

    /// Remove `key`
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Get the store backend type
    fn backend_type(&self) -> StoreBackend;
}
