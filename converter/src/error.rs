//! Error types for the survey conversion pipeline.
//!
//! Errors are layered by pipeline stage:
//!
//! - [`LoadError`] - reading the workbook or CSV tables
//! - [`BuildError`] - deriving events, occurrences and facts
//! - [`OutputError`] - serializing and committing the output tables
//! - [`PipelineError`] - top-level orchestration
//!
//! Missing cell values are never errors; they only suppress derived records.
//! Conversion is automatic via `From`, so `?` works across stage boundaries.

use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// Loading Errors
// =============================================================================

/// Errors while reading input tables.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Failed to read a file.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The spreadsheet could not be opened or a sheet could not be read.
    #[error("Workbook error in {path}: {message}")]
    Workbook { path: PathBuf, message: String },

    /// A delimited table could not be decoded.
    #[error("Invalid CSV in table '{table}': {message}")]
    Csv { table: String, message: String },

    /// Input path is neither a workbook nor a directory of CSV tables.
    #[error("Unsupported input {0}: expected .xlsx/.xlsm/.xls/.ods or a directory of CSV tables")]
    UnsupportedInput(PathBuf),

    /// A named table is absent from the input.
    #[error("Table '{table}' not found (available: {available})")]
    MissingTable { table: String, available: String },

    /// An expected column is absent from a table.
    #[error("Table '{table}' is missing column '{column}'")]
    MissingColumn { table: String, column: String },
}

// =============================================================================
// Build Errors
// =============================================================================

/// Errors while deriving Darwin Core records.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A value that must be present for identifier construction is missing.
    #[error("{table} row {row}: required value '{column}' is missing")]
    MissingValue {
        table: &'static str,
        row: usize,
        column: &'static str,
    },

    /// Cruise identifier is missing, non-numeric, non-finite or fractional.
    #[error("Station row {row}: cruise_id {value:?} is not an integer")]
    InvalidCruiseId { row: usize, value: String },

    /// Two derived records share an identifier.
    #[error("Duplicate {kind} identifier '{id}'")]
    DuplicateId { kind: &'static str, id: String },

    /// A station event points at a cruise event that was never built.
    #[error("Event '{event_id}' references unknown parent '{parent_id}'")]
    DanglingParent { event_id: String, parent_id: String },
}

// =============================================================================
// Output Errors
// =============================================================================

/// Errors while writing output tables.
#[derive(Debug, Error)]
pub enum OutputError {
    /// Filesystem failure while writing or committing a table.
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Record serialization failed.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// Buffered CSV output could not be flushed.
    #[error("Failed to flush CSV buffer: {0}")]
    Flush(String),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline errors returned by [`crate::transform::pipeline::convert`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input loading error.
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    /// Record derivation error.
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    /// Output error.
    #[error("Output error: {0}")]
    Output(#[from] OutputError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for loading operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Result type for build operations.
pub type BuildResult<T> = Result<T, BuildError>;

/// Result type for output operations.
pub type OutputResult<T> = Result<T, OutputError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let load_err = LoadError::MissingColumn {
            table: "Station".into(),
            column: "cruise_id".into(),
        };
        let pipeline_err: PipelineError = load_err.into();
        let msg = pipeline_err.to_string();
        assert!(msg.contains("Station"));
        assert!(msg.contains("cruise_id"));

        let build_err = BuildError::DuplicateId {
            kind: "occurrence",
            id: "S1_P1_lobster_1".into(),
        };
        let pipeline_err: PipelineError = build_err.into();
        assert!(pipeline_err.to_string().contains("S1_P1_lobster_1"));
    }

    #[test]
    fn test_invalid_cruise_id_format() {
        let err = BuildError::InvalidCruiseId {
            row: 3,
            value: "NaN".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("row 3"));
        assert!(msg.contains("\"NaN\""));
    }
}
