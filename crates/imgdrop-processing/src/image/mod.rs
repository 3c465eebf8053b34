//! Image operations
//!
//! - EXIF orientation correction (orientation)
//! - Fit-within downscaling (resize)
//! - The crop detour (crop)

pub mod crop;
pub mod orientation;
pub mod resize;

pub use orientation::ImageOrientation;
pub use resize::ImageResize;
