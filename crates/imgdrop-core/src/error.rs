//! Error types module
//!
//! Every imgdrop crate defines its own `thiserror` enum. They all implement
//! [`ErrorMetadata`] so the facade can decide, per error, whether it is
//! surfaced to the user, how loudly it is logged and what message is shown.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like compression or persistence failures
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata describing how an error should be presented and logged.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "FILE_TOO_LARGE")
    fn error_code(&self) -> &'static str;

    /// Whether the operation can simply be retried
    fn is_recoverable(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;

    /// User-facing message (may differ from the internal error message)
    fn client_message(&self) -> String;
}

/// Emit `err` through `tracing` at the level its metadata asks for.
pub fn log_with_level<E>(err: &E, context: &str)
where
    E: ErrorMetadata + std::fmt::Display,
{
    match err.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %err, code = err.error_code(), "{}", context)
        }
        LogLevel::Warn => {
            tracing::warn!(error = %err, code = err.error_code(), "{}", context)
        }
        LogLevel::Error => {
            tracing::error!(error = %err, code = err.error_code(), "{}", context)
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Compression quality must be in (0, 1], got {0}")]
    InvalidQuality(f32),

    #[error("{field} must be a positive number")]
    NotPositive { field: &'static str },

    #[error("max_files must be at least 1")]
    ZeroMaxFiles,

    #[error("Session key must not be empty")]
    EmptySessionKey,

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

impl ErrorMetadata for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            ConfigError::InvalidQuality(_) => "INVALID_QUALITY",
            ConfigError::NotPositive { .. } => "NOT_POSITIVE",
            ConfigError::ZeroMaxFiles => "ZERO_MAX_FILES",
            ConfigError::EmptySessionKey => "EMPTY_SESSION_KEY",
            ConfigError::InvalidValue { .. } => "INVALID_CONFIG_VALUE",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }

    fn log_level(&self) -> LogLevel {
        LogLevel::Error
    }

    fn client_message(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_metadata() {
        let err = ConfigError::InvalidQuality(1.5);
        assert_eq!(err.error_code(), "INVALID_QUALITY");
        assert!(!err.is_recoverable());
        assert_eq!(err.log_level(), LogLevel::Error);
        assert!(err.client_message().contains("1.5"));
    }

    #[test]
    fn test_not_positive_message() {
        let err = ConfigError::NotPositive { field: "max_width" };
        assert_eq!(err.to_string(), "max_width must be a positive number");
    }
}
