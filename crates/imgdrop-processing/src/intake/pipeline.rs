//! Intake pipeline: gate → read → compress → record → route.
//!
//! Admitted files are processed strictly one after another so that progress
//! is monotonic. A compression failure only costs the compression (the
//! original bytes are kept); an unreadable file fails the whole batch.

use futures::stream::{self, Stream, StreamExt};
use std::sync::Arc;

use imgdrop_core::{
    log_with_level, CompressionSpec, ErrorMetadata, FileRecord, LogLevel, ObjectUrlRegistry,
    RawFile, UploaderConfig,
};

use crate::compression::Compressor;
use crate::validator::{FileGate, GateResult, Rejection};

/// Batch failure
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("Failed to read {name}: {source}")]
    Read {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

impl ErrorMetadata for IntakeError {
    fn error_code(&self) -> &'static str {
        match self {
            IntakeError::Read { .. } => "FILE_READ_FAILED",
        }
    }

    fn is_recoverable(&self) -> bool {
        true
    }

    fn log_level(&self) -> LogLevel {
        LogLevel::Error
    }

    fn client_message(&self) -> String {
        format!("Error processing files: {}", self)
    }
}

/// Where the records of a batch go next
#[derive(Debug)]
pub enum Route {
    /// Nothing was admitted.
    Empty,
    /// Commit the records to the collection.
    Accept(Vec<FileRecord>),
    /// A single image waiting for the crop detour.
    Crop(FileRecord),
}

/// Outcome of one batch. Rejections are reported even when the batch failed.
#[derive(Debug)]
pub struct IntakeOutcome {
    pub rejections: Vec<Rejection>,
    pub route: Result<Route, IntakeError>,
}

pub struct IntakePipeline {
    gate: FileGate,
    compression: Option<CompressionSpec>,
    compressor: Arc<dyn Compressor>,
    crop_enabled: bool,
    registry: Arc<ObjectUrlRegistry>,
}

impl IntakePipeline {
    pub fn new(
        config: &UploaderConfig,
        compressor: Arc<dyn Compressor>,
        registry: Arc<ObjectUrlRegistry>,
    ) -> Self {
        Self {
            gate: FileGate::from_config(config),
            compression: config.compression.clone(),
            compressor,
            crop_enabled: config.active_crop().is_some(),
            registry,
        }
    }

    pub fn gate(&self, batch: Vec<RawFile>, current_count: usize) -> GateResult {
        self.gate.validate(batch, current_count)
    }

    /// Gate and process one batch, reporting progress after every record.
    pub async fn ingest<F>(
        &self,
        batch: Vec<RawFile>,
        current_count: usize,
        on_progress: F,
    ) -> IntakeOutcome
    where
        F: FnMut(f64) + Send,
    {
        let GateResult {
            admitted,
            rejections,
        } = self.gate(batch, current_count);

        IntakeOutcome {
            rejections,
            route: self.process(admitted, on_progress).await,
        }
    }

    /// Process already admitted files and pick the route.
    pub async fn process<F>(
        &self,
        admitted: Vec<RawFile>,
        mut on_progress: F,
    ) -> Result<Route, IntakeError>
    where
        F: FnMut(f64) + Send,
    {
        if admitted.is_empty() {
            return Ok(Route::Empty);
        }

        tracing::info!(files = admitted.len(), "Processing batch");

        let mut records = Vec::with_capacity(admitted.len());
        let mut items = Box::pin(self.stream(admitted));
        while let Some(item) = items.next().await {
            match item {
                Ok((record, percent)) => {
                    records.push(record);
                    on_progress(percent);
                }
                Err(e) => {
                    log_with_level(&e, "Batch aborted");
                    for record in records {
                        record.release();
                    }
                    return Err(e);
                }
            }
        }

        if self.crop_enabled && records.len() == 1 && records[0].is_image() {
            if let Some(record) = records.pop() {
                return Ok(Route::Crop(record));
            }
        }

        tracing::info!(files = records.len(), "Batch processed");
        Ok(Route::Accept(records))
    }

    /// Lazily turn admitted files into records, yielding each with the batch
    /// progress in percent.
    pub fn stream(
        &self,
        admitted: Vec<RawFile>,
    ) -> impl Stream<Item = Result<(FileRecord, f64), IntakeError>> + Send + '_ {
        let total = admitted.len();
        stream::iter(admitted.into_iter().enumerate()).then(move |(index, raw)| async move {
            let record = self.process_file(&raw).await?;
            let percent = (index + 1) as f64 / total as f64 * 100.0;
            Ok((record, percent))
        })
    }

    /// Read one file, compress it when it is an image and compression is
    /// configured, and mint its record.
    pub async fn process_file(&self, raw: &RawFile) -> Result<FileRecord, IntakeError> {
        let loaded = raw.read().await.map_err(|source| IntakeError::Read {
            name: raw.name.clone(),
            source,
        })?;

        let loaded = match &self.compression {
            Some(spec) if loaded.meta.is_image() => {
                match self.compressor.compress(loaded.clone(), spec).await {
                    Ok(compressed) => compressed,
                    Err(e) => {
                        tracing::warn!(
                            file = %raw.name,
                            error = %e,
                            code = e.error_code(),
                            "Image compression failed, using original file"
                        );
                        loaded
                    }
                }
            }
            _ => loaded,
        };

        tracing::debug!(
            file = %loaded.meta.name,
            size = loaded.meta.size,
            content_type = %loaded.meta.mime_type,
            "File processed"
        );

        Ok(FileRecord::from_loaded(loaded, &self.registry))
    }
}
