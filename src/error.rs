//! Error types for the aggregation pipeline.
//!
//! Every error is fatal: the pipeline aborts on the first failure and
//! performs no partial-result recovery or retries.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, AggregateError>;

/// Aggregation pipeline error types.
#[derive(Error, Debug)]
pub enum AggregateError {
    /// An expected (run, scenario) directory is missing or has no .csv trial files.
    #[error("no trial .csv files found under {path}")]
    MissingInput {
        /// The (run, scenario) directory that yielded no trials.
        path: PathBuf,
    },

    /// Trial tables within one scenario disagree on columns or row counts.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Failed to read a CSV table.
    #[error("failed to read {path}: {source}")]
    Read {
        /// Path of the offending file.
        path: PathBuf,
        /// Underlying CSV/IO error.
        source: csv::Error,
    },

    /// Failed to write a CSV table.
    #[error("failed to write {path}: {source}")]
    Write {
        /// Path of the offending file.
        path: PathBuf,
        /// Underlying CSV/IO error.
        source: csv::Error,
    },

    /// Underlying filesystem failure (directory listing, directory creation).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_input_names_the_path() {
        let err = AggregateError::MissingInput {
            path: PathBuf::from("Runs/run1/straightLine"),
        };
        let msg = err.to_string();
        assert!(msg.contains("Runs/run1/straightLine"));
        assert!(msg.contains("no trial .csv files"));
    }

    #[test]
    fn test_schema_mismatch_message() {
        let err = AggregateError::SchemaMismatch("expected 10 rows, got 9".to_string());
        assert!(err.to_string().contains("expected 10 rows, got 9"));
    }
}
