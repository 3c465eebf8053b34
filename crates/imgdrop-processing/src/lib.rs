//! imgdrop Processing Library
//!
//! Everything that happens to a batch between selection and acceptance:
//! validation against the accept list and the size/count limits, image
//! re-encoding, the intake pipeline that turns raw files into records, and
//! the crop detour for single-image batches.

pub mod compression;
pub mod image;
pub mod intake;
pub mod validator;

pub use compression::{CompressionError, Compressor, ImageCompressor, OutputFormat};
pub use crate::image::crop::{
    initial_selection, CenteredCropSelector, ChannelCropSelector, CropDetour, CropError,
    CropPrompt, CropRect, CropRequest, CropSelection, CropSelector, ImageCropper,
};
pub use crate::image::{ImageOrientation, ImageResize};
pub use intake::{IntakeError, IntakeOutcome, IntakePipeline, Route};
pub use validator::{parse_accept, AcceptPattern, FileGate, GateResult, Rejection, ValidationError};
