//! Crop detour for single-image batches.
//!
//! The interactive part lives outside this crate behind [`CropSelector`]: it
//! receives a [`CropRequest`] and answers with a selection in the coordinates
//! of the image as it was rendered, or `None` when the user cancels.
//! [`ImageCropper`] maps that selection back onto native pixels and produces
//! the cropped JPEG record. [`CropDetour`] ties both together.

use async_trait::async_trait;
use bytes::Bytes;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use std::io::Cursor;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

use imgdrop_core::constants::{CROP_JPEG_QUALITY, INITIAL_CROP_WIDTH_RATIO};
use imgdrop_core::{
    CropShape, CropSpec, ErrorMetadata, FileMeta, FileRecord, LoadedFile, LogLevel,
    ObjectUrlRegistry,
};

use super::{ImageOrientation, ImageResize};
use crate::compression::{CompressionError, OutputFormat};

#[derive(Debug, thiserror::Error)]
pub enum CropError {
    #[error("Failed to decode image for cropping: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Invalid crop selection: {0}")]
    InvalidSelection(String),

    #[error(transparent)]
    Encode(#[from] CompressionError),

    #[error("Crop task failed: {0}")]
    Task(String),
}

impl ErrorMetadata for CropError {
    fn error_code(&self) -> &'static str {
        match self {
            CropError::Decode(_) => "CROP_DECODE_FAILED",
            CropError::InvalidSelection(_) => "INVALID_CROP_SELECTION",
            CropError::Encode(_) => "CROP_ENCODE_FAILED",
            CropError::Task(_) => "CROP_TASK_FAILED",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, CropError::InvalidSelection(_))
    }

    fn log_level(&self) -> LogLevel {
        LogLevel::Error
    }

    fn client_message(&self) -> String {
        format!("Error cropping image: {}", self)
    }
}

/// Rectangle in pixels. Rendered coordinates may be fractional.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Suggested starting selection: centered, half the rendered width, at the
/// given aspect ratio, shrunk to fit when it would be taller than the image.
pub fn initial_selection(rendered_width: f64, rendered_height: f64, aspect: f64) -> CropRect {
    let mut width = rendered_width * INITIAL_CROP_WIDTH_RATIO;
    let mut height = width / aspect;
    if height > rendered_height {
        height = rendered_height;
        width = height * aspect;
    }

    CropRect {
        x: (rendered_width - width) / 2.0,
        y: (rendered_height - height) / 2.0,
        width,
        height,
    }
}

/// What the crop UI needs to show the image and the selection frame.
#[derive(Debug, Clone)]
pub struct CropRequest {
    pub file_name: String,
    pub mime_type: String,
    /// Image payload to display.
    pub image: Bytes,
    pub natural_width: u32,
    pub natural_height: u32,
    pub shape: CropShape,
    /// Locked aspect ratio of the selection (width / height).
    pub aspect: f64,
    /// Suggested selection for an image rendered at its natural size.
    pub initial: CropRect,
}

/// The user's final choice: a rectangle relative to the rendered image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropSelection {
    pub rect: CropRect,
    pub rendered_width: f64,
    pub rendered_height: f64,
}

impl CropSelection {
    /// Selection made on an image rendered at its natural size.
    pub fn natural(rect: CropRect, natural_width: u32, natural_height: u32) -> Self {
        Self {
            rect,
            rendered_width: natural_width as f64,
            rendered_height: natural_height as f64,
        }
    }
}

/// The interactive crop collaborator. `None` means the user cancelled.
#[async_trait]
pub trait CropSelector: Send + Sync {
    async fn select(&self, request: CropRequest) -> Option<CropSelection>;
}

/// Accepts the suggested initial selection without asking anyone.
#[derive(Debug, Clone, Copy, Default)]
pub struct CenteredCropSelector;

#[async_trait]
impl CropSelector for CenteredCropSelector {
    async fn select(&self, request: CropRequest) -> Option<CropSelection> {
        Some(CropSelection::natural(
            request.initial,
            request.natural_width,
            request.natural_height,
        ))
    }
}

/// A pending crop question delivered to the UI task.
#[derive(Debug)]
pub struct CropPrompt {
    pub request: CropRequest,
    respond: oneshot::Sender<Option<CropSelection>>,
}

impl CropPrompt {
    pub fn complete(self, selection: CropSelection) {
        let _ = self.respond.send(Some(selection));
    }

    /// Dropping the prompt has the same effect.
    pub fn cancel(self) {
        let _ = self.respond.send(None);
    }
}

/// Forwards crop requests over a channel to a UI task and waits for its answer.
#[derive(Debug, Clone)]
pub struct ChannelCropSelector {
    sender: mpsc::Sender<CropPrompt>,
}

impl ChannelCropSelector {
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<CropPrompt>) {
        let (sender, receiver) = mpsc::channel(buffer.max(1));
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl CropSelector for ChannelCropSelector {
    async fn select(&self, request: CropRequest) -> Option<CropSelection> {
        let (respond, answer) = oneshot::channel();
        let file_name = request.file_name.clone();

        if self.sender.send(CropPrompt { request, respond }).await.is_err() {
            tracing::warn!(file = %file_name, "Crop UI is gone, treating crop as cancelled");
            return None;
        }

        answer.await.unwrap_or(None)
    }
}

/// Cuts a rendered-coordinate selection out of the native image.
#[derive(Debug, Clone)]
pub struct ImageCropper {
    quality: u8,
}

impl Default for ImageCropper {
    fn default() -> Self {
        Self {
            quality: CROP_JPEG_QUALITY,
        }
    }
}

impl ImageCropper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Displayed size of the image: decoded dimensions with EXIF rotation
    /// taken into account.
    pub fn natural_size(data: &[u8]) -> Result<(u32, u32), CropError> {
        let (width, height) = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| CropError::Decode(image::ImageError::IoError(e)))?
            .into_dimensions()
            .map_err(CropError::Decode)?;

        if ImageOrientation::read_exif_orientation(data) >= 5 {
            Ok((height, width))
        } else {
            Ok((width, height))
        }
    }

    /// Native-pixel rectangle covered by the selection, clamped to the image.
    /// Returns `(x, y, width, height)`.
    pub fn source_rect(
        selection: &CropSelection,
        natural_width: u32,
        natural_height: u32,
    ) -> Result<(u32, u32, u32, u32), CropError> {
        if selection.rendered_width <= 0.0 || selection.rendered_height <= 0.0 {
            return Err(CropError::InvalidSelection(
                "rendered image size must be positive".to_string(),
            ));
        }

        let scale_x = natural_width as f64 / selection.rendered_width;
        let scale_y = natural_height as f64 / selection.rendered_height;
        let rect = selection.rect;

        let x0 = (rect.x * scale_x).round().clamp(0.0, natural_width as f64);
        let y0 = (rect.y * scale_y).round().clamp(0.0, natural_height as f64);
        let x1 = ((rect.x + rect.width) * scale_x)
            .round()
            .clamp(0.0, natural_width as f64);
        let y1 = ((rect.y + rect.height) * scale_y)
            .round()
            .clamp(0.0, natural_height as f64);

        if x1 - x0 < 1.0 || y1 - y0 < 1.0 {
            return Err(CropError::InvalidSelection(format!(
                "selection {:?} covers no pixels",
                rect
            )));
        }

        Ok((x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32))
    }

    /// Output size: both configured dimensions when present, else the
    /// rendered size of the selection.
    pub fn output_size(selection: &CropSelection, spec: &CropSpec) -> (u32, u32) {
        if let Some(size) = spec.target_size() {
            return size;
        }
        (
            (selection.rect.width.round() as u32).max(1),
            (selection.rect.height.round() as u32).max(1),
        )
    }

    /// Crop synchronously and return the JPEG payload.
    pub fn crop_blocking(
        &self,
        data: &[u8],
        selection: &CropSelection,
        spec: &CropSpec,
    ) -> Result<Bytes, CropError> {
        let format = image::guess_format(data).map_err(CropError::Decode)?;
        let mut img: DynamicImage =
            image::load_from_memory_with_format(data, format).map_err(CropError::Decode)?;
        if format == ImageFormat::Jpeg {
            img = ImageOrientation::apply_exif_orientation(img, data);
        }

        let (natural_width, natural_height) = img.dimensions();
        let (x, y, width, height) = Self::source_rect(selection, natural_width, natural_height)?;
        let (out_width, out_height) = Self::output_size(selection, spec);

        tracing::debug!(
            x = x,
            y = y,
            width = width,
            height = height,
            out_width = out_width,
            out_height = out_height,
            "Cropping image"
        );

        let cropped = img.crop_imm(x, y, width, height);
        let output = if (width, height) == (out_width, out_height) {
            cropped
        } else {
            ImageResize::resize_image(&cropped, out_width, out_height)
        };

        Ok(OutputFormat::Jpeg.encode(&output, self.quality)?)
    }

    /// Crop `record` and build the resulting record. The source record is
    /// left untouched.
    pub async fn crop(
        &self,
        record: &FileRecord,
        selection: &CropSelection,
        spec: &CropSpec,
        registry: &Arc<ObjectUrlRegistry>,
    ) -> Result<FileRecord, CropError> {
        let cropper = self.clone();
        let data = record.handle().clone();
        let selection = *selection;
        let spec = spec.clone();

        let output = tokio::task::spawn_blocking(move || {
            cropper.crop_blocking(&data, &selection, &spec)
        })
        .await
        .map_err(|e| CropError::Task(e.to_string()))??;

        let meta = FileMeta::now(
            record.name(),
            output.len() as u64,
            OutputFormat::Jpeg.to_mime_type(),
        );
        Ok(FileRecord::from_loaded(LoadedFile::new(meta, output), registry))
    }
}

/// Runs one record through the crop selector and the cropper.
pub struct CropDetour {
    selector: Arc<dyn CropSelector>,
    cropper: ImageCropper,
    registry: Arc<ObjectUrlRegistry>,
}

impl CropDetour {
    pub fn new(selector: Arc<dyn CropSelector>, registry: Arc<ObjectUrlRegistry>) -> Self {
        Self {
            selector,
            cropper: ImageCropper::new(),
            registry,
        }
    }

    pub fn request_for(record: &FileRecord, spec: &CropSpec) -> Result<CropRequest, CropError> {
        let (natural_width, natural_height) = ImageCropper::natural_size(record.handle())?;
        let aspect = spec.effective_aspect();

        Ok(CropRequest {
            file_name: record.name().to_string(),
            mime_type: record.meta().mime_type.clone(),
            image: record.handle().clone(),
            natural_width,
            natural_height,
            shape: spec.shape,
            aspect,
            initial: initial_selection(natural_width as f64, natural_height as f64, aspect),
        })
    }

    /// Ask for a selection and crop. Consumes `record`: it is released on
    /// cancellation, on failure and after a successful crop.
    pub async fn run(
        &self,
        record: FileRecord,
        spec: &CropSpec,
    ) -> Result<Option<FileRecord>, CropError> {
        let request = match Self::request_for(&record, spec) {
            Ok(request) => request,
            Err(e) => {
                record.release();
                return Err(e);
            }
        };

        tracing::info!(file = %record.name(), shape = %spec.shape, "Awaiting crop selection");

        let Some(selection) = self.selector.select(request).await else {
            tracing::info!(file = %record.name(), "Crop cancelled");
            record.release();
            return Ok(None);
        };

        let result = self
            .cropper
            .crop(&record, &selection, spec, &self.registry)
            .await;
        record.release();
        result.map(Some)
    }
}
