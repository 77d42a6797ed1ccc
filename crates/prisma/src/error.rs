//! Error types for the Prisma library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Prisma operations.
///
/// Only failures that make a run impossible end up here. Anything that
/// affects a single statistical test or a single claim degrades to an
/// undefined ground-truth entry or an UNVERIFIED verdict instead.
#[derive(Debug, Error)]
pub enum PrismaError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid delimiter detected or specified.
    #[error("Invalid delimiter: {0}")]
    InvalidDelimiter(String),

    /// Empty file or no data to analyze.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Two columns share the same name.
    #[error("Duplicate column name '{column}' in dataset schema")]
    DuplicateColumn { column: String },

    /// A column's length does not match the rest of the dataset.
    #[error("Column '{column}' has {found} values, expected {expected}")]
    RaggedColumn {
        column: String,
        expected: usize,
        found: usize,
    },

    /// A configured column does not exist in the dataset.
    #[error("Unknown column '{0}'")]
    UnknownColumn(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML configuration parse error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Saving or loading a ground-truth store failed.
    #[error("Persistence error: {0}")]
    Persistence(String),
}

/// Result type alias for Prisma operations.
pub type Result<T> = std::result::Result<T, PrismaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_column_names_offender() {
        let err = PrismaError::DuplicateColumn {
            column: "age".to_string(),
        };
        assert!(err.to_string().contains("'age'"));
    }

    #[test]
    fn test_ragged_column_message() {
        let err = PrismaError::RaggedColumn {
            column: "bmi".to_string(),
            expected: 10,
            found: 9,
        };
        assert_eq!(err.to_string(), "Column 'bmi' has 9 values, expected 10");
    }
}
