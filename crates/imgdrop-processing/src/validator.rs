use imgdrop_core::{ErrorMetadata, ErrorText, LogLevel, RawFile, UploaderConfig};
use regex::Regex;

/// Why a file (or a whole batch) was turned away
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("File type not accepted: {name}")]
    FileType { name: String },

    #[error("File too large: {name} is {size} bytes (max: {max} bytes)")]
    FileSize { name: String, size: u64, max: u64 },

    #[error("Maximum number of files reached ({max})")]
    MaxFiles { max: usize },
}

impl ErrorMetadata for ValidationError {
    fn error_code(&self) -> &'static str {
        match self {
            ValidationError::FileType { .. } => "FILE_TYPE_NOT_SUPPORTED",
            ValidationError::FileSize { .. } => "FILE_TOO_LARGE",
            ValidationError::MaxFiles { .. } => "MAX_FILES_EXCEEDED",
        }
    }

    fn is_recoverable(&self) -> bool {
        true
    }

    fn log_level(&self) -> LogLevel {
        LogLevel::Debug
    }

    fn client_message(&self) -> String {
        self.to_string()
    }
}

/// A rejection together with the user-facing message built from [`ErrorText`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub error: ValidationError,
    pub message: String,
}

/// One entry of an accept list.
#[derive(Debug, Clone)]
pub enum AcceptPattern {
    /// `.png`: matched against the end of the lowercased file name.
    Extension(String),
    /// `image/*`: matched against the whole MIME type, case-insensitively.
    Mime(Regex),
}

impl AcceptPattern {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        if raw.starts_with('.') {
            return Some(AcceptPattern::Extension(raw.to_lowercase()));
        }

        let body = raw
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");
        match Regex::new(&format!("(?i)^{}$", body)) {
            Ok(re) => Some(AcceptPattern::Mime(re)),
            Err(e) => {
                tracing::warn!(pattern = %raw, error = %e, "Ignoring unusable accept pattern");
                None
            }
        }
    }

    pub fn matches(&self, file: &RawFile) -> bool {
        match self {
            AcceptPattern::Extension(ext) => file.name.to_lowercase().ends_with(ext.as_str()),
            AcceptPattern::Mime(re) => re.is_match(&file.mime_type),
        }
    }
}

/// Parse a comma-separated accept string (`"image/*,.pdf"`). Blank entries
/// are ignored; an empty result accepts every file.
pub fn parse_accept(accept: &str) -> Vec<AcceptPattern> {
    accept.split(',').filter_map(AcceptPattern::parse).collect()
}

/// Result of gating one batch
#[derive(Debug, Default)]
pub struct GateResult {
    pub admitted: Vec<RawFile>,
    pub rejections: Vec<Rejection>,
}

impl GateResult {
    pub fn messages(&self) -> Vec<String> {
        self.rejections.iter().map(|r| r.message.clone()).collect()
    }
}

/// Type, size and count validation of a raw batch
///
/// The gate holds no state between batches: the caller passes the size of
/// the current collection with every call.
pub struct FileGate {
    patterns: Vec<AcceptPattern>,
    max_size: u64,
    max_files: usize,
    error_text: ErrorText,
}

impl FileGate {
    pub fn new(accept: &str, max_size: u64, max_files: usize, error_text: ErrorText) -> Self {
        Self {
            patterns: parse_accept(accept),
            max_size,
            max_files,
            error_text,
        }
    }

    pub fn from_config(config: &UploaderConfig) -> Self {
        Self::new(
            &config.accept,
            config.max_size,
            config.max_files,
            config.error_text.clone(),
        )
    }

    pub fn max_files(&self) -> usize {
        self.max_files
    }

    /// Whether the file passes the accept list.
    pub fn accepts(&self, file: &RawFile) -> bool {
        self.patterns.is_empty() || self.patterns.iter().any(|p| p.matches(file))
    }

    /// Split `batch` into admitted files and rejections.
    ///
    /// Type is checked before size and a file failing the type check is not
    /// size-checked. Files over the count cap are dropped silently, except
    /// when the collection is already full: then nothing is admitted and a
    /// single `maxFiles` rejection is reported, whatever the batch size.
    pub fn validate(&self, batch: Vec<RawFile>, current_count: usize) -> GateResult {
        let mut result = GateResult::default();

        for file in batch {
            if !self.accepts(&file) {
                result.rejections.push(Rejection {
                    message: format!("{}: {}", file.name, self.error_text.file_type),
                    error: ValidationError::FileType { name: file.name },
                });
                continue;
            }

            if file.size > self.max_size {
                result.rejections.push(Rejection {
                    message: format!("{}: {}", file.name, self.error_text.file_size),
                    error: ValidationError::FileSize {
                        name: file.name,
                        size: file.size,
                        max: self.max_size,
                    },
                });
                continue;
            }

            result.admitted.push(file);
        }

        if current_count >= self.max_files {
            result.admitted.clear();
            result.rejections.push(Rejection {
                message: self.error_text.max_files.clone(),
                error: ValidationError::MaxFiles {
                    max: self.max_files,
                },
            });
        } else if current_count + result.admitted.len() > self.max_files {
            let allowed = self.max_files - current_count;
            tracing::debug!(
                dropped = result.admitted.len() - allowed,
                allowed = allowed,
                "Batch exceeds file limit, truncating"
            );
            result.admitted.truncate(allowed);
        }

        for rejection in &result.rejections {
            imgdrop_core::log_with_level(&rejection.error, "File rejected");
        }

        result
    }
}
