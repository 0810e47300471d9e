//! Error types for the curation pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for curation operations.
#[derive(Debug, Error)]
pub enum CurateError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed numeric data in a source file.
    #[error("Parse error in '{file}' at line {line}: {message}")]
    Parse {
        file: String,
        line: usize,
        message: String,
    },

    /// No candidate input files were found for a species/title.
    #[error("No files found in '{dir}'")]
    NoInputFiles { dir: PathBuf },

    /// Inputs to a lumped cross section disagree on required-equal metadata.
    #[error("Inconsistent metadata across lumped inputs ({}): {message}", fields.join(", "))]
    Consistency { fields: Vec<String>, message: String },

    /// Augmentation did not supply the fields a process category declares.
    #[error("Augmentation mismatch for '{record}' (process '{process}'): {message}")]
    AugmentMapping {
        record: String,
        process: String,
        message: String,
    },

    /// A required field was never set on a cross section.
    #[error("Cross section '{record}' is missing required field '{field}'")]
    MissingField { record: String, field: String },

    /// Declared and actual data row counts differ.
    #[error("Row count mismatch in '{file}': expected {expected}, read {actual}")]
    RowCount {
        file: String,
        expected: usize,
        actual: usize,
    },

    /// An augment rule or record names a field that does not exist.
    #[error("Unknown cross-section field: {0}")]
    UnknownField(String),

    /// A field was given a value of the wrong type.
    #[error("Invalid value for field '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// A cross section id is not present in the store.
    #[error("Cross section {cs_id} not found")]
    NotFound { cs_id: i64 },

    /// Configuration or usage error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Regex compilation error.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML deserialization error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// XML description could not be parsed.
    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),
}

impl CurateError {
    /// Wrap an IO error with the path it occurred on.
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CurateError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for curation operations.
pub type Result<T> = std::result::Result<T, CurateError>;
