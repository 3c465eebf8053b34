//! Application-wide constants.

/// Maximum number of accepted files when not configured.
pub const DEFAULT_MAX_FILES: usize = 10;

/// Maximum size of a single file in bytes when not configured (5 MiB).
pub const DEFAULT_MAX_SIZE_BYTES: u64 = 5 * 1024 * 1024;

/// Key-value slot used for session persistence when no key is given.
pub const DEFAULT_SESSION_KEY: &str = "image-uploader-files";

/// Default compression settings.
pub const DEFAULT_COMPRESSION_QUALITY: f32 = 0.2;
pub const DEFAULT_COMPRESSION_MAX_WIDTH: u32 = 1920;
pub const DEFAULT_COMPRESSION_MAX_HEIGHT: u32 = 1080;

/// Cropped images are always re-encoded as JPEG at this quality (0-100).
pub const CROP_JPEG_QUALITY: u8 = 90;

/// Share of the rendered width covered by the suggested initial crop.
pub const INITIAL_CROP_WIDTH_RATIO: f64 = 0.5;

/// Scheme prefix of every minted object URL.
pub const OBJECT_URL_PREFIX: &str = "blob:imgdrop/";

/// MIME type used when nothing better is known.
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";
