//! Observer interface for uploader events
//!
//! The uploader reports through this trait instead of callbacks in its
//! configuration. Every method has a no-op default so implementors only
//! override what they care about.

use std::sync::Mutex;

use imgdrop_core::FileRecord;

/// Receives uploader events. Calls happen on the task driving the uploader,
/// in the order the events occur.
pub trait UploadObserver: Send + Sync {
    /// The accepted collection changed; `files` is the new collection.
    fn on_files_change(&self, _files: &[FileRecord]) {}

    /// A user-facing error message (one per rejected file, or one per failed batch).
    fn on_error(&self, _message: &str) {}

    /// Batch progress in percent, after each processed file.
    fn on_progress(&self, _percent: f64) {}

    /// A cropped record was committed.
    fn on_crop(&self, _record: &FileRecord) {}
}

/// No-op implementation for when nobody listens
pub struct NoOpObserver;

impl UploadObserver for NoOpObserver {}

/// One observed event. Records are captured by file name.
#[derive(Debug, Clone, PartialEq)]
pub enum ObserverEvent {
    FilesChanged(Vec<String>),
    Error(String),
    Progress(f64),
    Crop(String),
}

/// Observer that remembers every event, for tests and diagnostics.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ObserverEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ObserverEvent> {
        self.lock().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                ObserverEvent::Error(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn progress(&self) -> Vec<f64> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                ObserverEvent::Progress(percent) => Some(*percent),
                _ => None,
            })
            .collect()
    }

    /// File names of every collection snapshot reported, oldest first.
    pub fn file_changes(&self) -> Vec<Vec<String>> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                ObserverEvent::FilesChanged(names) => Some(names.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn crops(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                ObserverEvent::Crop(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ObserverEvent>> {
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn push(&self, event: ObserverEvent) {
        self.lock().push(event);
    }
}

impl UploadObserver for RecordingObserver {
    fn on_files_change(&self, files: &[FileRecord]) {
        self.push(ObserverEvent::FilesChanged(
            files.iter().map(|f| f.name().to_string()).collect(),
        ));
    }

    fn on_error(&self, message: &str) {
        self.push(ObserverEvent::Error(message.to_string()));
    }

    fn on_progress(&self, percent: f64) {
        self.push(ObserverEvent::Progress(percent));
    }

    fn on_crop(&self, record: &FileRecord) {
        self.push(ObserverEvent::Crop(record.name().to_string()));
    }
}
