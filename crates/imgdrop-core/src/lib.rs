//! imgdrop Core Library
//!
//! This crate provides the domain models, error metadata, configuration and
//! small utilities shared by every imgdrop component: file metadata and
//! records, compression/crop/session settings, ephemeral object URLs
//! and the data-URL encoding used for persistence.

pub mod config;
pub mod constants;
pub mod data_url;
pub mod error;
pub mod format;
pub mod models;
pub mod object_url;
pub mod storage_types;

// Re-export commonly used types
pub use config::{ErrorText, StoreConfig, UploaderConfig};
pub use error::{log_with_level, ConfigError, ErrorMetadata, LogLevel};
pub use format::{content_type_for_extension, format_file_size};
pub use models::{
    CompressionSpec, CropShape, CropSpec, FileMeta, FileRecord, FileSource, LoadedFile,
    PersistedRecord, RawFile, SessionSpec,
};
pub use object_url::{BinaryHandle, ObjectUrl, ObjectUrlRegistry};
pub use storage_types::StoreBackend;
