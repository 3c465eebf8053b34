//! The authoritative ordered collection of accepted records.
//!
//! Every mutation updates memory first, then notifies the observer, then
//! persists. Persistence problems are logged by the session store and never
//! reach the caller.

use std::sync::Arc;

use imgdrop_core::{ErrorMetadata, FileRecord, LogLevel, ObjectUrlRegistry, SessionSpec};
use imgdrop_storage::SessionStore;

use crate::observer::UploadObserver;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollectionError {
    #[error("Index {index} out of range for collection of {len} files")]
    IndexOutOfRange { index: usize, len: usize },
}

impl ErrorMetadata for CollectionError {
    fn error_code(&self) -> &'static str {
        match self {
            CollectionError::IndexOutOfRange { .. } => "INDEX_OUT_OF_RANGE",
        }
    }

    fn is_recoverable(&self) -> bool {
        true
    }

    fn log_level(&self) -> LogLevel {
        LogLevel::Debug
    }

    fn client_message(&self) -> String {
        self.to_string()
    }
}

/// Persistence target of a collection
pub struct SessionBinding {
    pub store: SessionStore,
    pub spec: SessionSpec,
}

pub struct CollectionController {
    records: Vec<FileRecord>,
    multiple: bool,
    session: Option<SessionBinding>,
    observer: Arc<dyn UploadObserver>,
}

impl CollectionController {
    pub fn new(
        multiple: bool,
        session: Option<SessionBinding>,
        observer: Arc<dyn UploadObserver>,
    ) -> Self {
        Self {
            records: Vec::new(),
            multiple,
            session: session.filter(|s| s.spec.enabled),
            observer,
        }
    }

    pub fn get_all(&self) -> &[FileRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Replace the (empty) collection with the persisted one. Notifies when
    /// something was restored; does not write back.
    pub async fn hydrate(&mut self, registry: &Arc<ObjectUrlRegistry>) {
        let Some(session) = &self.session else {
            return;
        };

        let restored = session.store.load(&session.spec.key, registry).await;
        if restored.is_empty() {
            return;
        }

        tracing::info!(key = %session.spec.key, files = restored.len(), "Restored session");
        let previous = std::mem::replace(&mut self.records, restored);
        release(previous);
        self.observer.on_files_change(&self.records);
    }

    /// Commit records: appended in multi-file mode, replacing the collection
    /// otherwise.
    pub async fn append(&mut self, records: Vec<FileRecord>) {
        if self.multiple {
            self.records.extend(records);
        } else {
            let previous = std::mem::replace(&mut self.records, records);
            release(previous);
        }

        tracing::debug!(files = self.records.len(), "Collection updated");
        self.observer.on_files_change(&self.records);

        if !self.records.is_empty() {
            self.save().await;
        }
    }

    pub async fn remove_at(&mut self, index: usize) -> Result<(), CollectionError> {
        if index >= self.records.len() {
            return Err(CollectionError::IndexOutOfRange {
                index,
                len: self.records.len(),
            });
        }

        let removed = self.records.remove(index);
        tracing::debug!(file = %removed.name(), index = index, "Removing file");
        removed.release();
        self.observer.on_files_change(&self.records);

        if self.records.is_empty() {
            self.clear_session().await;
        } else {
            self.save().await;
        }
        Ok(())
    }

    /// Drop every record. Idempotent.
    pub async fn clear(&mut self) {
        release(std::mem::take(&mut self.records));
        self.observer.on_files_change(&self.records);
        self.clear_session().await;
    }

    /// Release every record without notifying; optionally forget the session.
    pub async fn release_all(&mut self, clear_session: bool) {
        release(std::mem::take(&mut self.records));
        if clear_session {
            self.clear_session().await;
        }
    }

    async fn save(&self) {
        if let Some(session) = &self.session {
            session.store.save(&session.spec.key, &self.records).await;
        }
    }

    async fn clear_session(&self) {
        if let Some(session) = &self.session {
            session.store.clear(&session.spec.key).await;
        }
    }
}

fn release(records: Vec<FileRecord>) {
    for record in records {
        record.release();
    }
}
