// Error taxonomy for the similarity engine.
//
// Compression failures never show up here: they are absorbed at the
// compressor boundary and turned into the (0, 1.0) sentinel. Everything
// below is something a caller can observe and decide to skip.

use std::path::PathBuf;

/// Result alias for the library core.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors returned by the sampling, matrix and clustering primitives.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalysisError {
    /// Corpus directory is absent or holds no matching files.
    #[error("no corpus files found at {}", path.display())]
    MissingInput { path: PathBuf },

    /// A hierarchy needs at least two leaves.
    #[error("need at least 2 corpora to cluster, found {available}")]
    InsufficientData { available: usize },

    /// A matrix cell was never computed (all NCDs for the pair failed).
    #[error("distance between '{a}' and '{b}' was not computed")]
    IncompleteMatrix { a: String, b: String },

    /// A distance was NaN or infinite.
    #[error("distance between '{a}' and '{b}' is not finite")]
    NonFiniteDistance { a: String, b: String },

    /// Matrices being combined do not share the same labels.
    #[error("label mismatch: expected {expected:?}, found {found:?}")]
    LabelMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// Normalization target range is empty or inverted.
    #[error("invalid normalization range [{low}, {high}]")]
    InvalidRange { low: f64, high: f64 },

    /// Malformed matrix CSV.
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
}
