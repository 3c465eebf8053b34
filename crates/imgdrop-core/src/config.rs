//! Configuration module
//!
//! [`UploaderConfig`] is the single immutable configuration of an uploader
//! instance. It can be built in code (every field is public and documented
//! with its default) or loaded from `IMGDROP_*` environment variables.
//! [`StoreConfig`] selects the key-value backend used for session persistence.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::constants::{DEFAULT_MAX_FILES, DEFAULT_MAX_SIZE_BYTES, DEFAULT_SESSION_KEY};
use crate::error::ConfigError;
use crate::models::{CompressionSpec, CropShape, CropSpec, SessionSpec};
use crate::storage_types::StoreBackend;

/// User-facing texts of validation messages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorText {
    pub file_size: String,
    pub file_type: String,
    pub max_files: String,
}

impl Default for ErrorText {
    fn default() -> Self {
        Self {
            file_size: "File size exceeds the maximum limit".to_string(),
            file_type: "File type not supported".to_string(),
            max_files: "Maximum number of files exceeded".to_string(),
        }
    }
}

/// Uploader configuration
#[derive(Clone, Debug)]
pub struct UploaderConfig {
    /// Keep appending batches (`true`) or replace the collection with each
    /// batch (`false`). Default: `false`.
    pub multiple: bool,
    /// Comma-separated accepted types: MIME patterns (`image/*`) or
    /// extensions (`.png`). Empty accepts everything. Default: `""`.
    pub accept: String,
    /// Maximum number of accepted files. Default: 10.
    pub max_files: usize,
    /// Maximum size of a single file in bytes. Default: 5 MiB.
    pub max_size: u64,
    /// Ignore new batches and picker requests. Default: `false`.
    pub disabled: bool,
    /// Re-encode images before acceptance. `None` keeps files as-is.
    /// Default: quality 0.2 within 1920x1080.
    pub compression: Option<CompressionSpec>,
    /// Route single-image batches through the crop detour. Default: `None`.
    pub crop: Option<CropSpec>,
    /// Persist the collection in the key-value store. Default: `None`.
    pub session: Option<SessionSpec>,
    /// Texts used for validation messages.
    pub error_text: ErrorText,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            multiple: false,
            accept: String::new(),
            max_files: DEFAULT_MAX_FILES,
            max_size: DEFAULT_MAX_SIZE_BYTES,
            disabled: false,
            compression: Some(CompressionSpec::default()),
            crop: None,
            session: None,
            error_text: ErrorText::default(),
        }
    }
}

impl UploaderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_files == 0 {
            return Err(ConfigError::ZeroMaxFiles);
        }
        if self.max_size == 0 {
            return Err(ConfigError::NotPositive { field: "max_size" });
        }
        if let Some(compression) = &self.compression {
            compression.validate()?;
        }
        if let Some(crop) = &self.crop {
            crop.validate()?;
        }
        if let Some(session) = &self.session {
            session.validate()?;
        }
        Ok(())
    }

    /// Crop settings, only when the detour is switched on.
    pub fn active_crop(&self) -> Option<&CropSpec> {
        self.crop.as_ref().filter(|c| c.enabled)
    }

    /// Session settings, only when persistence is switched on.
    pub fn active_session(&self) -> Option<&SessionSpec> {
        self.session.as_ref().filter(|s| s.enabled)
    }

    /// Load configuration from the environment (and `.env`).
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        let config = Self::from_lookup(|key| env::var(key).ok())?;
        Ok(config)
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let compression = if lookup("IMGDROP_COMPRESSION")
            .map(|v| v.trim().eq_ignore_ascii_case("off"))
            .unwrap_or(false)
        {
            None
        } else {
            let base = defaults.compression.clone().unwrap_or_default();
            Some(CompressionSpec {
                quality: parse_var(&lookup, "IMGDROP_COMPRESSION_QUALITY")?
                    .unwrap_or(base.quality),
                max_width: parse_var(&lookup, "IMGDROP_MAX_WIDTH")?.or(base.max_width),
                max_height: parse_var(&lookup, "IMGDROP_MAX_HEIGHT")?.or(base.max_height),
                convert_size: parse_var(&lookup, "IMGDROP_CONVERT_SIZE")?.or(base.convert_size),
            })
        };

        let crop = match lookup("IMGDROP_CROP") {
            Some(shape) if !shape.trim().is_empty() && !shape.trim().eq_ignore_ascii_case("off") => {
                let shape = CropShape::from_str(shape.trim()).map_err(|_| {
                    ConfigError::InvalidValue {
                        key: "IMGDROP_CROP".to_string(),
                        value: shape.clone(),
                    }
                })?;
                Some(CropSpec {
                    enabled: true,
                    shape,
                    width: parse_var(&lookup, "IMGDROP_CROP_WIDTH")?,
                    height: parse_var(&lookup, "IMGDROP_CROP_HEIGHT")?,
                    aspect: parse_var(&lookup, "IMGDROP_CROP_ASPECT")?,
                })
            }
            _ => None,
        };

        let session = if parse_bool(&lookup, "IMGDROP_SESSION")?.unwrap_or(false) {
            Some(SessionSpec {
                enabled: true,
                key: lookup("IMGDROP_SESSION_KEY")
                    .filter(|k| !k.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_SESSION_KEY.to_string()),
                clear_on_detach: parse_bool(&lookup, "IMGDROP_SESSION_CLEAR_ON_DETACH")?
                    .unwrap_or(false),
            })
        } else {
            None
        };

        let config = Self {
            multiple: parse_bool(&lookup, "IMGDROP_MULTIPLE")?.unwrap_or(defaults.multiple),
            accept: lookup("IMGDROP_ACCEPT").unwrap_or(defaults.accept),
            max_files: parse_var(&lookup, "IMGDROP_MAX_FILES")?.unwrap_or(defaults.max_files),
            max_size: parse_var(&lookup, "IMGDROP_MAX_SIZE_BYTES")?.unwrap_or(defaults.max_size),
            disabled: parse_bool(&lookup, "IMGDROP_DISABLED")?.unwrap_or(defaults.disabled),
            compression,
            crop,
            session,
            error_text: defaults.error_text,
        };

        config.validate()?;
        Ok(config)
    }
}

/// Key-value store selection
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Directory of the local backend.
    pub local_path: Option<PathBuf>,
    /// Byte quota of the memory backend (`None` = unlimited).
    pub memory_quota_bytes: Option<usize>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            local_path: None,
            memory_quota_bytes: None,
        }
    }
}

impl StoreConfig {
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: StoreBackend::Local,
            local_path: Some(path.into()),
            memory_quota_bytes: None,
        }
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        let config = Self::from_lookup(|key| env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = match lookup("IMGDROP_STORE") {
            Some(value) => StoreBackend::from_str(value.trim()).map_err(|_| {
                ConfigError::InvalidValue {
                    key: "IMGDROP_STORE".to_string(),
                    value,
                }
            })?,
            None => StoreBackend::default(),
        };

        Ok(Self {
            backend,
            local_path: lookup("IMGDROP_STORE_PATH").map(PathBuf::from),
            memory_quota_bytes: parse_var(&lookup, "IMGDROP_STORE_QUOTA_BYTES")?,
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value,
            }),
        _ => Ok(None),
    }
}

fn parse_bool<F>(lookup: &F, key: &str) -> Result<Option<bool>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) => match value.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            "" => Ok(None),
            _ => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                value,
            }),
        },
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = UploaderConfig::default();
        assert!(!config.multiple);
        assert_eq!(config.max_files, 10);
        assert_eq!(config.max_size, 5_242_880);
        assert_eq!(config.compression, Some(CompressionSpec::default()));
        assert!(config.active_crop().is_none());
        assert!(config.active_session().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup_empty_matches_defaults() {
        let config = UploaderConfig::from_lookup(lookup_from(&[])).unwrap();
        let defaults = UploaderConfig::default();
        assert_eq!(config.max_files, defaults.max_files);
        assert_eq!(config.max_size, defaults.max_size);
        assert_eq!(config.compression, defaults.compression);
        assert!(config.crop.is_none());
        assert!(config.session.is_none());
    }

    #[test]
    fn test_from_lookup_full() {
        let config = UploaderConfig::from_lookup(lookup_from(&[
            ("IMGDROP_MULTIPLE", "true"),
            ("IMGDROP_ACCEPT", "image/*,.pdf"),
            ("IMGDROP_MAX_FILES", "3"),
            ("IMGDROP_MAX_SIZE_BYTES", "1024"),
            ("IMGDROP_COMPRESSION_QUALITY", "0.8"),
            ("IMGDROP_MAX_WIDTH", "800"),
            ("IMGDROP_CROP", "circle"),
            ("IMGDROP_CROP_ASPECT", "1.5"),
            ("IMGDROP_SESSION", "yes"),
            ("IMGDROP_SESSION_KEY", "avatar"),
            ("IMGDROP_SESSION_CLEAR_ON_DETACH", "1"),
        ]))
        .unwrap();

        assert!(config.multiple);
        assert_eq!(config.accept, "image/*,.pdf");
        assert_eq!(config.max_files, 3);
        assert_eq!(config.max_size, 1024);

        let compression = config.compression.unwrap();
        assert_eq!(compression.quality, 0.8);
        assert_eq!(compression.max_width, Some(800));
        assert_eq!(compression.max_height, Some(1080));

        let crop = config.crop.unwrap();
        assert_eq!(crop.shape, CropShape::Circle);
        assert_eq!(crop.effective_aspect(), 1.5);

        let session = config.session.unwrap();
        assert_eq!(session.key, "avatar");
        assert!(session.clear_on_detach);
    }

    #[test]
    fn test_from_lookup_compression_off() {
        let config =
            UploaderConfig::from_lookup(lookup_from(&[("IMGDROP_COMPRESSION", "off")])).unwrap();
        assert!(config.compression.is_none());
    }

    #[test]
    fn test_from_lookup_rejects_garbage() {
        assert!(matches!(
            UploaderConfig::from_lookup(lookup_from(&[("IMGDROP_MAX_FILES", "many")])),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            UploaderConfig::from_lookup(lookup_from(&[("IMGDROP_MULTIPLE", "perhaps")])),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            UploaderConfig::from_lookup(lookup_from(&[("IMGDROP_MAX_FILES", "0")])),
            Err(ConfigError::ZeroMaxFiles)
        ));
    }

    #[test]
    fn test_store_config_from_lookup() {
        let config = StoreConfig::from_lookup(lookup_from(&[
            ("IMGDROP_STORE", "local"),
            ("IMGDROP_STORE_PATH", "/tmp/imgdrop"),
        ]))
        .unwrap();
        assert_eq!(config.backend, StoreBackend::Local);
        assert_eq!(config.local_path, Some(PathBuf::from("/tmp/imgdrop")));

        let config = StoreConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, StoreConfig::default());

        assert!(StoreConfig::from_lookup(lookup_from(&[("IMGDROP_STORE", "s3")])).is_err());
    }
}
