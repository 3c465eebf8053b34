use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::constants::{
    DEFAULT_COMPRESSION_MAX_HEIGHT, DEFAULT_COMPRESSION_MAX_WIDTH, DEFAULT_COMPRESSION_QUALITY,
    DEFAULT_SESSION_KEY,
};
use crate::error::ConfigError;

/// Re-encoding constraints applied to image files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressionSpec {
    /// Lossy quality in `(0, 1]`.
    pub quality: f32,
    /// Images wider than this are scaled down, keeping the aspect ratio.
    pub max_width: Option<u32>,
    /// Images taller than this are scaled down, keeping the aspect ratio.
    pub max_height: Option<u32>,
    /// PNG files larger than this many bytes are converted to JPEG.
    pub convert_size: Option<u64>,
}

impl Default for CompressionSpec {
    fn default() -> Self {
        Self {
            quality: DEFAULT_COMPRESSION_QUALITY,
            max_width: Some(DEFAULT_COMPRESSION_MAX_WIDTH),
            max_height: Some(DEFAULT_COMPRESSION_MAX_HEIGHT),
            convert_size: None,
        }
    }
}

impl CompressionSpec {
    pub fn with_quality(quality: f32) -> Self {
        Self {
            quality,
            max_width: None,
            max_height: None,
            convert_size: None,
        }
    }

    /// JPEG quality on the 1-100 scale
    pub fn jpeg_quality(&self) -> u8 {
        (self.quality * 100.0).round().clamp(1.0, 100.0) as u8
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.quality > 0.0 && self.quality <= 1.0) {
            return Err(ConfigError::InvalidQuality(self.quality));
        }
        if self.max_width == Some(0) {
            return Err(ConfigError::NotPositive { field: "max_width" });
        }
        if self.max_height == Some(0) {
            return Err(ConfigError::NotPositive { field: "max_height" });
        }
        if self.convert_size == Some(0) {
            return Err(ConfigError::NotPositive {
                field: "convert_size",
            });
        }
        Ok(())
    }
}

/// Shape of the crop mask shown to the user.
///
/// The shape only affects presentation; the cropped output is always a
/// rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropShape {
    Circle,
    #[default]
    Square,
}

impl FromStr for CropShape {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "circle" => Ok(CropShape::Circle),
            "square" => Ok(CropShape::Square),
            _ => Err(anyhow::anyhow!("Invalid crop shape: {}", s)),
        }
    }
}

impl Display for CropShape {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            CropShape::Circle => write!(f, "circle"),
            CropShape::Square => write!(f, "square"),
        }
    }
}

/// Crop detour settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropSpec {
    pub enabled: bool,
    pub shape: CropShape,
    /// Target output width in pixels.
    pub width: Option<u32>,
    /// Target output height in pixels.
    pub height: Option<u32>,
    /// Explicit aspect ratio (width / height).
    pub aspect: Option<f64>,
}

impl CropSpec {
    pub fn new(shape: CropShape) -> Self {
        Self {
            enabled: true,
            shape,
            width: None,
            height: None,
            aspect: None,
        }
    }

    pub fn circle() -> Self {
        Self::new(CropShape::Circle)
    }

    pub fn square() -> Self {
        Self::new(CropShape::Square)
    }

    /// Aspect ratio used for the selection: explicit `aspect`, else
    /// `width / height`, else 1.
    pub fn effective_aspect(&self) -> f64 {
        if let Some(aspect) = self.aspect {
            return aspect;
        }
        match (self.width, self.height) {
            (Some(w), Some(h)) if h > 0 => w as f64 / h as f64,
            _ => 1.0,
        }
    }

    /// Fixed output size, when both dimensions are configured.
    pub fn target_size(&self) -> Option<(u32, u32)> {
        match (self.width, self.height) {
            (Some(w), Some(h)) => Some((w, h)),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == Some(0) {
            return Err(ConfigError::NotPositive { field: "crop.width" });
        }
        if self.height == Some(0) {
            return Err(ConfigError::NotPositive {
                field: "crop.height",
            });
        }
        if let Some(aspect) = self.aspect {
            if !(aspect.is_finite() && aspect > 0.0) {
                return Err(ConfigError::NotPositive {
                    field: "crop.aspect",
                });
            }
        }
        Ok(())
    }
}

/// Session persistence settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSpec {
    pub enabled: bool,
    /// Key of the key-value slot holding the collection.
    pub key: String,
    /// Remove the persisted collection when the uploader is detached.
    pub clear_on_detach: bool,
}

impl Default for SessionSpec {
    fn default() -> Self {
        Self {
            enabled: false,
            key: DEFAULT_SESSION_KEY.to_string(),
            clear_on_detach: false,
        }
    }
}

impl SessionSpec {
    /// Enabled session persistence under `key`.
    pub fn with_key(key: impl Into<String>) -> Self {
        Self {
            enabled: true,
            key: key.into(),
            clear_on_detach: false,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled && self.key.trim().is_empty() {
            return Err(ConfigError::EmptySessionKey);
        }
        Ok(())
    }
}
