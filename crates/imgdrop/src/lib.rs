//! imgdrop
//!
//! File intake for image uploads: pick or receive a batch of files, validate
//! it against the accept list and the size/count limits, compress images,
//! optionally crop a single image, keep the accepted files in an ordered
//! collection and persist that collection to a key-value store.
//!
//! [`Uploader`] is the entry point. It is configured with an
//! [`UploaderConfig`] and wired to its collaborators through
//! [`UploaderParts`]; everything it reports goes to an [`UploadObserver`].

pub mod collection;
pub mod observer;
pub mod uploader;

pub use collection::{CollectionController, CollectionError, SessionBinding};
pub use observer::{NoOpObserver, ObserverEvent, RecordingObserver, UploadObserver};
pub use uploader::{AddOutcome, FilePicker, SharedUploader, UploadError, Uploader, UploaderParts};

pub use imgdrop_core::{
    format_file_size, CompressionSpec, CropShape, CropSpec, ErrorText, FileMeta, FileRecord,
    ObjectUrlRegistry, RawFile, SessionSpec, StoreConfig, UploaderConfig,
};
pub use imgdrop_processing::{
    initial_selection, CenteredCropSelector, ChannelCropSelector, Compressor, CropPrompt, CropRect,
    CropRequest, CropSelection, CropSelector, ImageCompressor,
};
pub use imgdrop_storage::{create_store, KeyValueStore, LocalStore, MemoryStore, SessionStore};
