//! Error types for the data-loader crate.
//!
//! Every variant here is fatal: a `LoadError` means startup must stop and
//! nothing that was partially read is exposed.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading the recommender artifacts
#[derive(Error, Debug)]
pub enum LoadError {
    /// Artifact file does not exist
    #[error("Artifact not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// I/O error occurred while reading an artifact
    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File content could not be decoded into the expected shape
    #[error("Malformed artifact {file}: {reason}")]
    Malformed { file: String, reason: String },

    /// CSR arrays are inconsistent with each other
    #[error("Invalid interaction matrix: {0}")]
    InvalidMatrix(String),

    /// Forward and reverse mapping tables do not form a bijection
    #[error("Invalid {kind} mapping: {reason}")]
    InvalidMapping { kind: String, reason: String },

    /// Two artifacts disagree on a dimension
    #[error("Dimension mismatch for {what}: expected {expected}, found {found}")]
    DimensionMismatch {
        what: String,
        expected: usize,
        found: usize,
    },

    /// Factorization model parameters are unusable
    #[error("Invalid model: {0}")]
    InvalidModel(String),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, LoadError>;
