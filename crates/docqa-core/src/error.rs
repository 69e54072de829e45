use thiserror::Error;

/// Caller-facing failures of the core operations.
///
/// Degenerate data (empty vocabulary, zero passages, no surviving answers)
/// is not an error: those paths return empty results.
#[derive(Debug, Error)]
pub enum Error {
    #[error("document is empty after text normalization")]
    EmptyDocument,

    #[error("question must not be empty")]
    EmptyQuestion,

    #[error("no documents uploaded: the index has no passages to search")]
    EmptyCorpus,

    #[error("document not found: {0}")]
    NotFound(String),

    #[error("window size must be >= 1 (got {0})")]
    InvalidWindowSize(usize),

    #[error("invalid fusion weights: similarity={similarity}, extraction={extraction} (extraction must be greater and both non-negative)")]
    InvalidWeights { similarity: f64, extraction: f64 },
}

pub type Result<T> = std::result::Result<T, Error>;
