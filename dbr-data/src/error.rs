/// Error types for data loading and column access
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataError {
    /// Failed to read a data file
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse CSV data
    #[error("Failed to parse CSV: {0}")]
    CsvParse(#[from] csv::Error),

    /// Column referenced by a chart or filter does not exist
    #[error("Column '{column}' not found in data (available: {available})")]
    UnknownColumn { column: String, available: String },

    /// A column that must be numeric holds a non-numeric value
    #[error("Column '{column}' must be numeric, found '{value}'")]
    NonNumeric { column: String, value: String },

    /// Row width does not match the header
    #[error("Row {row} has {found} fields, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// Filter cannot be evaluated
    #[error("Invalid filter on '{column}': {reason}")]
    InvalidFilter { column: String, reason: String },
}

/// Type alias for Results using DataError
pub type Result<T> = std::result::Result<T, DataError>;
