use std::path::PathBuf;

use imgdrop::{format_file_size, FileRecord, UploadObserver};

/// Directory of the session store when neither `--store` nor
/// `IMGDROP_STORE_PATH` is given.
pub const DEFAULT_STORE_DIR: &str = ".imgdrop";

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Pick the store directory: explicit flag, then configuration, then the default.
pub fn store_dir(flag: Option<PathBuf>, configured: Option<PathBuf>) -> PathBuf {
    flag.or(configured)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_DIR))
}

/// One table row of `imgdrop list`.
pub fn format_row(index: usize, record: &FileRecord) -> String {
    let meta = record.meta();
    format!(
        "{:>5} {:<30} {:<20} {:>12} {:>20}",
        index,
        truncate_string(&meta.name, 30),
        truncate_string(&meta.mime_type, 20),
        format_file_size(meta.size),
        meta.last_modified.format("%Y-%m-%d %H:%M:%S")
    )
}

/// Prints uploader events to the terminal.
pub struct ConsoleObserver;

impl UploadObserver for ConsoleObserver {
    fn on_error(&self, message: &str) {
        eprintln!("error: {}", message);
    }

    fn on_progress(&self, percent: f64) {
        eprintln!("processing... {:.0}%", percent);
    }

    fn on_crop(&self, record: &FileRecord) {
        println!(
            "Cropped {} ({})",
            record.name(),
            format_file_size(record.meta().size)
        );
    }
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
