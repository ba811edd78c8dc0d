//! Error types for epitrend-io.

use std::path::PathBuf;

/// Error type for all fallible operations in the epitrend-io crate.
///
/// Covers acquisition of the raw table (file or HTTP), Arrow and Parquet
/// format errors, calendar problems, and accumulated validation failures
/// of raw rows and region series.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when a required file does not exist on disk.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// Path that could not be found.
        path: PathBuf,
    },

    /// Wraps an operating-system I/O failure.
    #[error("i/o error on {}: {reason}", path.display())]
    Io {
        /// Path being read or written.
        path: PathBuf,
        /// Description of the underlying failure.
        reason: String,
    },

    /// Wraps a failed HTTP download.
    #[error("download of {url} failed: {reason}")]
    Http {
        /// Requested URL.
        url: String,
        /// Description of the underlying failure.
        reason: String,
    },

    /// Wraps an error from Arrow: CSV parsing or encoding, record batch assembly.
    #[error("arrow error: {reason}")]
    Arrow {
        /// Description of the underlying Arrow failure.
        reason: String,
    },

    /// Wraps an error originating from the Parquet library.
    #[error("parquet error: {reason}")]
    Parquet {
        /// Description of the underlying Parquet failure.
        reason: String,
    },

    /// Wraps an error originating from the epitrend-calendar crate.
    #[error("calendar error: {reason}")]
    Calendar {
        /// Description of the underlying calendar failure.
        reason: String,
    },

    /// Returned when one or more validation checks fail.
    #[error("{count} validation error(s): {details}")]
    Validation {
        /// Number of accumulated validation failures.
        count: usize,
        /// Human-readable summary of the failures.
        details: String,
    },

    /// Returned when a required column is absent from the raw table header.
    #[error("column '{name}' not found (available: {available})")]
    MissingColumn {
        /// Name of the missing column.
        name: String,
        /// Comma-separated header of the table.
        available: String,
    },

    /// Returned when the raw table holds no data rows.
    #[error("raw table has no rows")]
    EmptyTable,
}

impl From<arrow::error::ArrowError> for IoError {
    fn from(e: arrow::error::ArrowError) -> Self {
        IoError::Arrow {
            reason: e.to_string(),
        }
    }
}

impl From<parquet::errors::ParquetError> for IoError {
    fn from(e: parquet::errors::ParquetError) -> Self {
        IoError::Parquet {
            reason: e.to_string(),
        }
    }
}

impl From<epitrend_calendar::CalendarError> for IoError {
    fn from(e: epitrend_calendar::CalendarError) -> Self {
        IoError::Calendar {
            reason: e.to_string(),
        }
    }
}
