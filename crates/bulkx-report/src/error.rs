//! Error types for report generation.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading or rendering a report.
///
/// These are not recovered locally: a report that exists but cannot be
/// read as expected is surfaced to the caller.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed report XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("scanner '{name}' has an invalid count: {value:?}")]
    InvalidCount { name: String, value: String },

    #[error("table row has {actual} cells, expected {expected}")]
    RowWidth { expected: usize, actual: usize },
}

/// Result type for report operations.
pub type ReportResult<T> = Result<T, ReportError>;
