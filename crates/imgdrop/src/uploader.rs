//! The uploader controller
//!
//! Composes the intake pipeline, the crop detour and the collection behind
//! one object owned by the application. Mutations take `&mut self`, so one
//! instance never has two batches in flight; share it through
//! [`SharedUploader`] to queue batches from several tasks.

use async_trait::async_trait;
use std::sync::Arc;

use imgdrop_core::{
    log_with_level, ConfigError, ErrorMetadata, FileRecord, LogLevel, ObjectUrlRegistry, RawFile,
    UploaderConfig,
};
use imgdrop_processing::{
    CenteredCropSelector, Compressor, CropDetour, CropError, CropSelector, ImageCompressor,
    IntakeError, IntakePipeline, Route,
};
use imgdrop_storage::{KeyValueStore, MemoryStore, SessionStore};

use crate::collection::{CollectionController, CollectionError, SessionBinding};
use crate::observer::{NoOpObserver, UploadObserver};

/// Uploader shared between tasks. The mutex hands out access in FIFO order,
/// which makes it the batch queue.
pub type SharedUploader = Arc<tokio::sync::Mutex<Uploader>>;

/// Source of files for [`Uploader::open_picker`], e.g. a native file dialog.
#[async_trait]
pub trait FilePicker: Send + Sync {
    /// Ask the user for files. An empty result means nothing was picked.
    async fn pick(&self, multiple: bool, accept: &str) -> Vec<RawFile>;
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Batch(#[from] IntakeError),

    #[error(transparent)]
    Crop(#[from] CropError),

    #[error(transparent)]
    Collection(#[from] CollectionError),
}

impl ErrorMetadata for UploadError {
    fn error_code(&self) -> &'static str {
        match self {
            UploadError::Config(e) => e.error_code(),
            UploadError::Batch(e) => e.error_code(),
            UploadError::Crop(e) => e.error_code(),
            UploadError::Collection(e) => e.error_code(),
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            UploadError::Config(e) => e.is_recoverable(),
            UploadError::Batch(e) => e.is_recoverable(),
            UploadError::Crop(e) => e.is_recoverable(),
            UploadError::Collection(e) => e.is_recoverable(),
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            UploadError::Config(e) => e.log_level(),
            UploadError::Batch(e) => e.log_level(),
            UploadError::Crop(e) => e.log_level(),
            UploadError::Collection(e) => e.log_level(),
        }
    }

    fn client_message(&self) -> String {
        match self {
            UploadError::Config(e) => e.client_message(),
            UploadError::Batch(e) => e.client_message(),
            UploadError::Crop(e) => e.client_message(),
            UploadError::Collection(e) => e.client_message(),
        }
    }
}

/// What happened to a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// The uploader is disabled; the batch was ignored.
    Disabled,
    /// Every file was rejected, or there were none.
    NothingAdmitted,
    /// This many records were committed.
    Accepted(usize),
    /// The single image went through the crop detour and was committed.
    Cropped,
    /// The user cancelled the crop; nothing was committed.
    CropCancelled,
}

/// Collaborators of an [`Uploader`]
pub struct UploaderParts {
    pub compressor: Arc<dyn Compressor>,
    pub store: Arc<dyn KeyValueStore>,
    pub crop_selector: Arc<dyn CropSelector>,
    pub picker: Option<Arc<dyn FilePicker>>,
    pub observer: Arc<dyn UploadObserver>,
    pub registry: Arc<ObjectUrlRegistry>,
}

impl Default for UploaderParts {
    fn default() -> Self {
        Self {
            compressor: Arc::new(ImageCompressor::new()),
            store: Arc::new(MemoryStore::new()),
            crop_selector: Arc::new(CenteredCropSelector),
            picker: None,
            observer: Arc::new(NoOpObserver),
            registry: ObjectUrlRegistry::new(),
        }
    }
}

impl UploaderParts {
    pub fn with_compressor(mut self, compressor: Arc<dyn Compressor>) -> Self {
        self.compressor = compressor;
        self
    }

    pub fn with_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_crop_selector(mut self, selector: Arc<dyn CropSelector>) -> Self {
        self.crop_selector = selector;
        self
    }

    pub fn with_picker(mut self, picker: Arc<dyn FilePicker>) -> Self {
        self.picker = Some(picker);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn UploadObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_registry(mut self, registry: Arc<ObjectUrlRegistry>) -> Self {
        self.registry = registry;
        self
    }
}

pub struct Uploader {
    config: UploaderConfig,
    pipeline: IntakePipeline,
    detour: CropDetour,
    collection: CollectionController,
    picker: Option<Arc<dyn FilePicker>>,
    observer: Arc<dyn UploadObserver>,
    registry: Arc<ObjectUrlRegistry>,
}

impl Uploader {
    /// Build an uploader and restore the persisted collection when session
    /// persistence is enabled.
    pub async fn new(config: UploaderConfig, parts: UploaderParts) -> Result<Self, UploadError> {
        config.validate()?;

        let UploaderParts {
            compressor,
            store,
            crop_selector,
            picker,
            observer,
            registry,
        } = parts;

        let session = config.active_session().map(|spec| SessionBinding {
            store: SessionStore::new(store.clone()),
            spec: spec.clone(),
        });

        let mut collection =
            CollectionController::new(config.multiple, session, observer.clone());
        collection.hydrate(&registry).await;

        tracing::debug!(
            multiple = config.multiple,
            max_files = config.max_files,
            max_size = config.max_size,
            crop = config.active_crop().is_some(),
            session = config.active_session().is_some(),
            backend = %store.backend_type(),
            "Uploader ready"
        );

        Ok(Self {
            pipeline: IntakePipeline::new(&config, compressor, registry.clone()),
            detour: CropDetour::new(crop_selector, registry.clone()),
            collection,
            picker,
            observer,
            registry,
            config,
        })
    }

    pub fn into_shared(self) -> SharedUploader {
        Arc::new(tokio::sync::Mutex::new(self))
    }

    pub fn config(&self) -> &UploaderConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ObjectUrlRegistry> {
        &self.registry
    }

    pub fn is_disabled(&self) -> bool {
        self.config.disabled
    }

    pub fn get_all(&self) -> &[FileRecord] {
        self.collection.get_all()
    }

    /// Validate, process and commit a batch.
    ///
    /// Every rejection and a batch failure are also reported through
    /// [`UploadObserver::on_error`].
    pub async fn add_files(&mut self, files: Vec<RawFile>) -> Result<AddOutcome, UploadError> {
        if self.config.disabled {
            tracing::debug!(files = files.len(), "Uploader disabled, ignoring batch");
            return Ok(AddOutcome::Disabled);
        }

        let observer = self.observer.clone();
        let outcome = self
            .pipeline
            .ingest(files, self.collection.len(), move |percent| {
                observer.on_progress(percent)
            })
            .await;

        for rejection in &outcome.rejections {
            self.observer.on_error(&rejection.message);
        }

        let route = match outcome.route {
            Ok(route) => route,
            Err(e) => {
                self.observer.on_error(&e.client_message());
                return Err(e.into());
            }
        };

        match route {
            Route::Empty => Ok(AddOutcome::NothingAdmitted),
            Route::Accept(records) => {
                let count = records.len();
                self.collection.append(records).await;
                Ok(AddOutcome::Accepted(count))
            }
            Route::Crop(record) => self.crop(record).await,
        }
    }

    async fn crop(&mut self, record: FileRecord) -> Result<AddOutcome, UploadError> {
        let Some(spec) = self.config.active_crop().cloned() else {
            self.collection.append(vec![record]).await;
            return Ok(AddOutcome::Accepted(1));
        };

        match self.detour.run(record, &spec).await {
            Ok(Some(cropped)) => {
                self.collection.append(vec![cropped]).await;
                if let Some(committed) = self.collection.get_all().last() {
                    self.observer.on_crop(committed);
                }
                Ok(AddOutcome::Cropped)
            }
            Ok(None) => Ok(AddOutcome::CropCancelled),
            Err(e) => {
                log_with_level(&e, "Crop failed");
                self.observer.on_error(&e.client_message());
                Err(e.into())
            }
        }
    }

    /// Ask the configured [`FilePicker`] for files and add them.
    pub async fn open_picker(&mut self) -> Result<AddOutcome, UploadError> {
        if self.config.disabled {
            return Ok(AddOutcome::Disabled);
        }

        let Some(picker) = self.picker.clone() else {
            tracing::debug!("No file picker configured");
            return Ok(AddOutcome::NothingAdmitted);
        };

        let files = picker.pick(self.config.multiple, &self.config.accept).await;
        if files.is_empty() {
            return Ok(AddOutcome::NothingAdmitted);
        }
        self.add_files(files).await
    }

    pub async fn remove_at(&mut self, index: usize) -> Result<(), UploadError> {
        self.collection.remove_at(index).await?;
        Ok(())
    }

    pub async fn clear_all(&mut self) {
        self.collection.clear().await;
    }

    /// Tear the uploader down: release every record and, when configured,
    /// forget the persisted session.
    pub async fn detach(mut self) {
        let clear_session = self
            .config
            .active_session()
            .map(|s| s.clear_on_detach)
            .unwrap_or(false);
        tracing::debug!(
            files = self.collection.len(),
            clear_session = clear_session,
            "Detaching uploader"
        );
        self.collection.release_all(clear_session).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::RecordingObserver;
    use imgdrop_core::{CropSpec, SessionSpec};

    fn text(name: &str) -> RawFile {
        RawFile::from_bytes(name, "text/plain", name.as_bytes().to_vec())
    }

    async fn uploader(config: UploaderConfig) -> (Uploader, Arc<RecordingObserver>) {
        let observer = Arc::new(RecordingObserver::new());
        let parts = UploaderParts::default().with_observer(observer.clone());
        (Uploader::new(config, parts).await.unwrap(), observer)
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let config = UploaderConfig {
            max_files: 0,
            ..Default::default()
        };
        let result = Uploader::new(config, UploaderParts::default()).await;
        assert!(matches!(
            result,
            Err(UploadError::Config(ConfigError::ZeroMaxFiles))
        ));
    }

    #[tokio::test]
    async fn test_disabled_ignores_everything() {
        let (mut uploader, observer) = uploader(UploaderConfig {
            disabled: true,
            ..Default::default()
        })
        .await;

        assert_eq!(
            uploader.add_files(vec![text("a.txt")]).await.unwrap(),
            AddOutcome::Disabled
        );
        assert_eq!(uploader.open_picker().await.unwrap(), AddOutcome::Disabled);
        assert!(uploader.get_all().is_empty());
        assert!(observer.events().is_empty());
    }

    #[tokio::test]
    async fn test_picker_without_collaborator_does_nothing() {
        let (mut uploader, _) = uploader(UploaderConfig::default()).await;
        assert_eq!(
            uploader.open_picker().await.unwrap(),
            AddOutcome::NothingAdmitted
        );
    }

    #[tokio::test]
    async fn test_non_image_skips_crop() {
        let (mut uploader, observer) = uploader(UploaderConfig {
            crop: Some(CropSpec::circle()),
            ..Default::default()
        })
        .await;

        let outcome = uploader.add_files(vec![text("notes.txt")]).await.unwrap();
        assert_eq!(outcome, AddOutcome::Accepted(1));
        assert!(observer.crops().is_empty());
    }

    #[tokio::test]
    async fn test_remove_at_out_of_range() {
        let (mut uploader, observer) = uploader(UploaderConfig::default()).await;
        uploader.add_files(vec![text("a.txt")]).await.unwrap();
        observer.clear();

        let err = uploader.remove_at(3).await.unwrap_err();
        assert!(matches!(
            err,
            UploadError::Collection(CollectionError::IndexOutOfRange { index: 3, len: 1 })
        ));
        assert_eq!(err.error_code(), "INDEX_OUT_OF_RANGE");
        assert_eq!(uploader.get_all().len(), 1);
        assert!(observer.events().is_empty());
    }

    #[tokio::test]
    async fn test_detach_keeps_session_by_default() {
        let store = Arc::new(MemoryStore::new());
        let config = UploaderConfig {
            session: Some(SessionSpec::with_key("s")),
            ..Default::default()
        };
        let parts = UploaderParts::default().with_store(store.clone());
        let mut uploader = Uploader::new(config, parts).await.unwrap();
        uploader.add_files(vec![text("a.txt")]).await.unwrap();
        let registry = uploader.registry().clone();

        uploader.detach().await;

        assert!(store.get("s").await.unwrap().is_some());
        assert_eq!(registry.live_count(), 0);
    }
}
