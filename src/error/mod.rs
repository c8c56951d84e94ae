//! Error handling for the cohort analysis.
//!
//! Only failures that stop a whole run live here: unreadable inputs, broken
//! Parquet/CSV data and invalid configuration. Problems with individual rows or
//! patients are never errors; they are counted and excluded (see
//! [`RejectReason`](crate::algorithm::cohort::RejectReason) and
//! [`RemovalReason`](crate::algorithm::cohort::RemovalReason)).

use std::io;

use arrow::error::ArrowError;
use parquet::errors::ParquetError;

/// Errors that abort an analysis run
#[derive(Debug, thiserror::Error)]
pub enum CohortError {
    /// Error opening or reading a file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error decoding Parquet data
    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    /// Error processing Arrow arrays (casts, CSV decoding)
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// Error reading or writing JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid study configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// A row source lacks a column the analysis needs
    #[error("Missing field: {0}")]
    MissingField(String),

    /// Input file with an extension no row source understands
    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(String),
}

impl CohortError {
    /// Build a configuration error from any message
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Result type for cohort analysis operations
pub type Result<T> = std::result::Result<T, CohortError>;
