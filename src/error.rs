use std::path::PathBuf;
use thiserror::Error;

/// The main error type for annocompare operations.
#[derive(Debug, Error)]
pub enum AnnocompareError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse VOC XML {path}: {message}")]
    VocXmlParse { path: PathBuf, message: String },

    #[error("Failed to scan annotation directory {path}: {message}")]
    DirectoryWalk { path: PathBuf, message: String },

    /// The input ensemble cannot be reconciled as configured, e.g. two
    /// annotator directories that no path suffix can tell apart.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid {name} threshold {value} (must be within [0, 1])")]
    InvalidThreshold { name: &'static str, value: f64 },

    #[error("Failed to write JSON report: {0}")]
    ReportJsonWrite(#[source] serde_json::Error),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Found {count} potential mislabel(s)")]
    MislabelsFound { count: usize },
}
