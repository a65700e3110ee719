//! Error types for the preparation pipeline.
//!
//! Every stage fails fast with one of these kinds. Drops and fills that the
//! pipeline performs on purpose (blank to missing, missing to median,
//! fully-missing column removal) are reported through the logger and never
//! surface here.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or preparing a table.
#[derive(Debug, Error)]
pub enum PrepError {
    /// The input file is absent or cannot be read.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The tabular structure is malformed (bad header, ragged rows, unknown format).
    #[error("Malformed table: {0}")]
    Parse(String),

    /// A configured column is absent, or a column has the wrong kind for its role.
    #[error("Schema mismatch: {0}")]
    Schema(String),

    /// The configuration contradicts itself or holds an out-of-range option.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A numeric column has zero variance when it reaches the division step.
    #[error("Column '{column}' has zero variance (constant value {value}) and cannot be standardized")]
    DegenerateColumn { column: String, value: f64 },

    /// Conversion to or from a polars frame failed.
    #[error(transparent)]
    Polars(#[from] polars::prelude::PolarsError),

    /// Fitted parameters or configuration could not be (de)serialized.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl PrepError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PrepError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn missing_column(column: &str, role: &str) -> Self {
        PrepError::Schema(format!("{} column '{}' not found in table", role, column))
    }
}

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, PrepError>;
