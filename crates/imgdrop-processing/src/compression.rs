use async_trait::async_trait;
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

use imgdrop_core::format::replace_extension;
use imgdrop_core::{CompressionSpec, ErrorMetadata, FileMeta, LoadedFile, LogLevel};

use crate::image::{ImageOrientation, ImageResize};

/// Image re-encoding failures. The intake pipeline logs them and keeps the
/// original bytes.
#[derive(Debug, thiserror::Error)]
pub enum CompressionError {
    #[error("Failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Failed to encode image as {format:?}: {source}")]
    Encode {
        format: OutputFormat,
        #[source]
        source: image::ImageError,
    },

    #[error("Compression task failed: {0}")]
    Task(String),
}

impl ErrorMetadata for CompressionError {
    fn error_code(&self) -> &'static str {
        match self {
            CompressionError::Decode(_) => "IMAGE_DECODE_FAILED",
            CompressionError::Encode { .. } => "IMAGE_ENCODE_FAILED",
            CompressionError::Task(_) => "COMPRESSION_TASK_FAILED",
        }
    }

    fn is_recoverable(&self) -> bool {
        true
    }

    fn log_level(&self) -> LogLevel {
        LogLevel::Warn
    }

    fn client_message(&self) -> String {
        "Image could not be compressed".to_string()
    }
}

/// Output format for re-encoded images
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
}

impl OutputFormat {
    pub fn to_mime_type(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::WebP => "image/webp",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::WebP => "webp",
        }
    }

    pub fn to_image_format(self) -> ImageFormat {
        match self {
            OutputFormat::Jpeg => ImageFormat::Jpeg,
            OutputFormat::Png => ImageFormat::Png,
            OutputFormat::WebP => ImageFormat::WebP,
        }
    }

    /// Format an input of `source` format (and `input_len` bytes) is written as.
    pub fn for_input(source: ImageFormat, input_len: u64, spec: &CompressionSpec) -> Self {
        match source {
            ImageFormat::Jpeg => OutputFormat::Jpeg,
            ImageFormat::Png => match spec.convert_size {
                Some(threshold) if input_len > threshold => OutputFormat::Jpeg,
                _ => OutputFormat::Png,
            },
            ImageFormat::WebP => OutputFormat::WebP,
            _ => OutputFormat::Png,
        }
    }

    /// Encode `img` in this format. `quality` (1-100) only applies to JPEG.
    pub fn encode(self, img: &DynamicImage, quality: u8) -> Result<Bytes, CompressionError> {
        let mut buffer = Vec::new();
        let result = match self {
            OutputFormat::Jpeg => {
                let rgb = img.to_rgb8();
                JpegEncoder::new_with_quality(&mut buffer, quality).encode_image(&rgb)
            }
            OutputFormat::Png => img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png),
            OutputFormat::WebP => DynamicImage::ImageRgba8(img.to_rgba8())
                .write_to(&mut Cursor::new(&mut buffer), ImageFormat::WebP),
        };

        result.map_err(|source| CompressionError::Encode {
            format: self,
            source,
        })?;
        Ok(Bytes::from(buffer))
    }
}

/// Re-encodes image files under a [`CompressionSpec`].
#[async_trait]
pub trait Compressor: Send + Sync {
    async fn compress(
        &self,
        file: LoadedFile,
        spec: &CompressionSpec,
    ) -> Result<LoadedFile, CompressionError>;
}

/// [`Compressor`] backed by the `image` crate
///
/// Decoding and encoding are CPU-bound and run on the blocking pool.
#[derive(Debug, Clone)]
pub struct ImageCompressor {
    strict: bool,
}

impl Default for ImageCompressor {
    fn default() -> Self {
        Self { strict: true }
    }
}

impl ImageCompressor {
    pub fn new() -> Self {
        Self::default()
    }

    /// In strict mode (the default) an untouched image whose re-encoding is
    /// not smaller than the input is returned as-is.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Synchronous compression, for callers already off the async runtime.
    pub fn compress_blocking(
        &self,
        file: &LoadedFile,
        spec: &CompressionSpec,
    ) -> Result<LoadedFile, CompressionError> {
        let source_format = image::guess_format(&file.data).map_err(CompressionError::Decode)?;
        let mut img = image::load_from_memory_with_format(&file.data, source_format)
            .map_err(CompressionError::Decode)?;

        let mut transformed = false;
        if source_format == ImageFormat::Jpeg {
            let orientation = ImageOrientation::read_exif_orientation(&file.data);
            if orientation != 1 {
                img = ImageOrientation::apply(img, orientation);
                transformed = true;
            }
        }

        if let Some(resized) = ImageResize::shrink_to_fit(&img, spec.max_width, spec.max_height) {
            img = resized;
            transformed = true;
        }

        let input_len = file.data.len() as u64;
        let target = OutputFormat::for_input(source_format, input_len, spec);
        let format_changed = target.to_image_format() != source_format;
        let output = target.encode(&img, spec.jpeg_quality())?;

        if self.strict && !transformed && !format_changed && output.len() as u64 >= input_len {
            tracing::debug!(
                file = %file.meta.name,
                original_size = input_len,
                compressed_size = output.len(),
                "Re-encoded image is not smaller, keeping original"
            );
            return Ok(file.clone());
        }

        let name = if format_changed {
            replace_extension(&file.meta.name, target.extension())
        } else {
            file.meta.name.clone()
        };

        tracing::debug!(
            file = %name,
            format = ?target,
            original_size = input_len,
            compressed_size = output.len(),
            "Image compressed"
        );

        Ok(LoadedFile::new(
            FileMeta::now(name, output.len() as u64, target.to_mime_type()),
            output,
        ))
    }
}

#[async_trait]
impl Compressor for ImageCompressor {
    async fn compress(
        &self,
        file: LoadedFile,
        spec: &CompressionSpec,
    ) -> Result<LoadedFile, CompressionError> {
        let compressor = self.clone();
        let spec = spec.clone();
        tokio::task::spawn_blocking(move || compressor.compress_blocking(&file, &spec))
            .await
            .map_err(|e| CompressionError::Task(e.to_string()))?
    }
}
