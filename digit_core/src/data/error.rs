//! Error types for dataset loading and preparation.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for data operations
pub type DataResult<T> = Result<T, DataError>;

/// Failures raised while loading raw digit pools or building partitions.
#[derive(Debug, Error)]
pub enum DataError {
    /// A per-digit group is missing, empty, too small, or has the wrong width.
    #[error("Data shape error: {0}")]
    DataShape(String),

    /// A partition ended up with no rows or no retained features.
    #[error("Empty partition: {0}")]
    EmptyPartition(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed CSV in {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },

    /// A pixel value that is not an integer in 0..=255.
    #[error("Invalid intensity {value:?} in {path} at row {row}, column {column}")]
    InvalidValue {
        path: PathBuf,
        row: usize,
        column: usize,
        value: String,
    },
}
