use bytes::Bytes;
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::FALLBACK_CONTENT_TYPE;
use crate::format::content_type_for_name;

/// Immutable description of a file.
///
/// Serialized as `{"name", "size", "type", "lastModified"}` with
/// `lastModified` in epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMeta {
    pub name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub mime_type: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_modified: DateTime<Utc>,
}

impl FileMeta {
    /// `last_modified` is truncated to the persisted millisecond precision.
    pub fn new(
        name: impl Into<String>,
        size: u64,
        mime_type: impl Into<String>,
        last_modified: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            size,
            mime_type: mime_type.into(),
            last_modified: to_millis(last_modified),
        }
    }

    /// Metadata of a file produced right now.
    pub fn now(name: impl Into<String>, size: u64, mime_type: impl Into<String>) -> Self {
        Self::new(name, size, mime_type, Utc::now())
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.to_lowercase().starts_with("image/")
    }
}

/// Drop sub-millisecond precision, which `lastModified` cannot carry.
pub fn to_millis(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.trunc_subsecs(3)
}

/// Where the bytes of a raw file live.
#[derive(Debug, Clone)]
pub enum FileSource {
    Memory(Bytes),
    Path(PathBuf),
}

/// A file offered to the uploader but not yet admitted.
///
/// Path-backed files are only read while the batch is processed, so an
/// unreadable file surfaces as a batch failure rather than at selection time.
#[derive(Debug, Clone)]
pub struct RawFile {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    pub source: FileSource,
}

impl RawFile {
    pub fn from_bytes(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        let data = data.into();
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size: data.len() as u64,
            last_modified: to_millis(Utc::now()),
            source: FileSource::Memory(data),
        }
    }

    /// Describe a file on disk. The MIME type is guessed from the extension.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let mime_type = content_type_for_name(&name)
            .unwrap_or(FALLBACK_CONTENT_TYPE)
            .to_string();
        let last_modified = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        Ok(Self {
            name,
            mime_type,
            size: metadata.len(),
            last_modified: to_millis(last_modified),
            source: FileSource::Path(path.to_path_buf()),
        })
    }

    pub fn with_last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = to_millis(last_modified);
        self
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.to_lowercase().starts_with("image/")
    }

    /// Read the payload.
    pub async fn read(&self) -> std::io::Result<LoadedFile> {
        let data = match &self.source {
            FileSource::Memory(bytes) => bytes.clone(),
            FileSource::Path(path) => Bytes::from(tokio::fs::read(path).await?),
        };

        Ok(LoadedFile {
            meta: FileMeta::new(
                self.name.clone(),
                data.len() as u64,
                self.mime_type.clone(),
                self.last_modified,
            ),
            data,
        })
    }
}

/// A file whose bytes are in memory.
#[derive(Debug, Clone)]
pub struct LoadedFile {
    pub meta: FileMeta,
    pub data: Bytes,
}

impl LoadedFile {
    pub fn new(meta: FileMeta, data: Bytes) -> Self {
        Self { meta, data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_file_meta_serialization_shape() {
        let meta = FileMeta {
            name: "cat.png".to_string(),
            size: 42,
            mime_type: "image/png".to_string(),
            last_modified: Utc.timestamp_millis_opt(1_700_000_000_123).unwrap(),
        };

        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["name"], "cat.png");
        assert_eq!(json["size"], 42);
        assert_eq!(json["type"], "image/png");
        assert_eq!(json["lastModified"], 1_700_000_000_123i64);

        let back: FileMeta = serde_json::from_value(json).unwrap();
        assert_eq!(back, meta);
    }

    #[test]
    fn test_timestamps_are_kept_to_the_millisecond() {
        let precise = Utc.timestamp_nanos(1_700_000_000_123_456_789);
        let millis = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();

        assert_eq!(FileMeta::new("a", 1, "text/plain", precise).last_modified, millis);
        assert_eq!(
            RawFile::from_bytes("a", "text/plain", b"a".to_vec())
                .with_last_modified(precise)
                .last_modified,
            millis
        );
        let now = FileMeta::now("a", 1, "text/plain").last_modified;
        assert_eq!(now.timestamp_subsec_nanos() % 1_000_000, 0);
    }

    #[test]
    fn test_file_meta_ignores_unknown_fields() {
        let json = r#"{"name":"a.jpg","size":1,"type":"image/jpeg","lastModified":0,"fileCategory":"image"}"#;
        let meta: FileMeta = serde_json::from_str(json).unwrap();
        assert_eq!(meta.name, "a.jpg");
        assert!(meta.is_image());
    }

    #[tokio::test]
    async fn test_raw_file_from_bytes_reads_back() {
        let raw = RawFile::from_bytes("notes.txt", "text/plain", b"hello".to_vec());
        assert_eq!(raw.size, 5);
        assert!(!raw.is_image());

        let loaded = raw.read().await.unwrap();
        assert_eq!(loaded.meta.size, 5);
        assert_eq!(&loaded.data[..], b"hello");
    }

    #[tokio::test]
    async fn test_raw_file_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.JPG");
        std::fs::write(&path, b"not really a jpeg").unwrap();

        let raw = RawFile::from_path(&path).await.unwrap();
        assert_eq!(raw.name, "photo.JPG");
        assert_eq!(raw.mime_type, "image/jpeg");
        assert_eq!(raw.size, 17);

        let loaded = raw.read().await.unwrap();
        assert_eq!(&loaded.data[..], b"not really a jpeg");
    }

    #[tokio::test]
    async fn test_raw_file_read_missing_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.png");
        std::fs::write(&path, b"x").unwrap();
        let raw = RawFile::from_path(&path).await.unwrap();
        std::fs::remove_file(&path).unwrap();

        assert!(raw.read().await.is_err());
    }
}
