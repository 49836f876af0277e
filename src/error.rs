//! Error types for the taxocomp library.

use thiserror::Error;

/// Main error type for the library.
///
/// Statistical computations never produce errors: degenerate inputs (empty
/// groups, zero variance, all-tied values) yield sentinel results instead.
/// Errors are reserved for structurally invalid caller input.
#[derive(Error, Debug)]
pub enum TaxocompError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid abundance value '{value}' at row {row}, column {col}")]
    InvalidAbundance {
        value: String,
        row: usize,
        col: usize,
    },

    #[error("Missing column '{0}' in metadata")]
    MissingColumn(String),

    #[error("Unknown sample group '{0}'")]
    UnknownGroup(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Empty data: {0}")]
    EmptyData(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, TaxocompError>;
