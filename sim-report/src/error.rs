//! Error types for sim-report.

use std::path::PathBuf;
use thiserror::Error;

/// Errors while writing report artifacts.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Could not create the output directory or write a file.
    #[error("failed to write {path}: {source}")]
    Io {
        /// File or directory being written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The report could not be encoded as JSON.
    #[error("failed to encode report: {0}")]
    Encode(#[from] serde_json::Error),
}
