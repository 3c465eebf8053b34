use bytes::Bytes;
use std::fmt;
use std::sync::Arc;

use super::{to_millis, FileMeta, LoadedFile, PersistedRecord};
use crate::data_url;
use crate::object_url::{BinaryHandle, ObjectUrl, ObjectUrlRegistry};

/// A processed file: metadata, durable encoding and ephemeral access.
///
/// `encoded_data` is the only part that can be persisted. The binary handle
/// and the access URL are process-local; the URL is revoked by
/// [`FileRecord::release`] or when the record is dropped.
pub struct FileRecord {
    meta: FileMeta,
    encoded_data: String,
    handle: BinaryHandle,
    access_url: ObjectUrl,
}

impl FileRecord {
    /// Build a record from freshly read or re-encoded bytes.
    pub fn from_loaded(file: LoadedFile, registry: &Arc<ObjectUrlRegistry>) -> Self {
        let encoded_data = data_url::encode(&file.meta.mime_type, &file.data);
        Self::from_parts(file.meta, encoded_data, file.data, registry)
    }

    /// Build a record whose encoded form is already known (session restore).
    pub fn from_parts(
        meta: FileMeta,
        encoded_data: String,
        payload: Bytes,
        registry: &Arc<ObjectUrlRegistry>,
    ) -> Self {
        let access_url = registry.mint(payload.clone());
        Self {
            meta: FileMeta {
                last_modified: to_millis(meta.last_modified),
                ..meta
            },
            encoded_data,
            handle: payload,
            access_url,
        }
    }

    pub fn meta(&self) -> &FileMeta {
        &self.meta
    }

    pub fn name(&self) -> &str {
        &self.meta.name
    }

    pub fn encoded_data(&self) -> &str {
        &self.encoded_data
    }

    pub fn handle(&self) -> &BinaryHandle {
        &self.handle
    }

    pub fn access_url(&self) -> &ObjectUrl {
        &self.access_url
    }

    pub fn is_image(&self) -> bool {
        self.meta.is_image()
    }

    /// Bytes plus metadata, e.g. to hand the record to an image operation.
    pub fn to_loaded(&self) -> LoadedFile {
        LoadedFile::new(self.meta.clone(), self.handle.clone())
    }

    /// The persisted shape of this record.
    pub fn to_persisted(&self) -> PersistedRecord {
        PersistedRecord {
            file: self.meta.clone(),
            base64: self.encoded_data.clone(),
        }
    }

    /// Revoke the access URL and drop the payload.
    pub fn release(self) {
        tracing::trace!(file = %self.meta.name, url = %self.access_url, "Releasing record");
        self.access_url.revoke();
    }
}

impl fmt::Debug for FileRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileRecord")
            .field("meta", &self.meta)
            .field("access_url", &self.access_url)
            .field("encoded_len", &self.encoded_data.len())
            .finish()
    }
}
