//! Error types for ridge-reasoner.

use thiserror::Error;

/// Result type for reasoner operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or running a reasoner.
#[derive(Debug, Error)]
pub enum Error {
    /// A term kernel failed; fatal to the round.
    #[error("term {term}: {source}")]
    Term {
        term: usize,
        #[source]
        source: ridge_core::Error,
    },

    /// Invalid term or consensus construction.
    #[error(transparent)]
    Core(#[from] ridge_core::Error),

    /// A term refers to a variable that was never added.
    #[error("unknown variable {index} (reasoner has {count} variables)")]
    UnknownVariable { index: usize, count: usize },

    /// A variable domain is empty or non-finite.
    #[error("invalid variable {index}: {reason}")]
    InvalidVariable { index: usize, reason: String },

    /// Configuration rejected by validation.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}
