//! Error types for beam characterization.

use thiserror::Error;

/// Result type alias using BeamError.
pub type BeamResult<T> = Result<T, BeamError>;

/// Primary error type for beam characterization.
///
/// Every call site documents whether a numerical edge case is reported
/// through [`BeamError::DegenerateInput`] or through a sentinel value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BeamError {
    /// Invalid static configuration: pixel counts, clip levels, mixture count.
    #[error("configuration error: {0}")]
    Config(String),

    /// A computed precondition failed mid-pipeline.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// The input has no mathematically defined answer.
    #[error("degenerate input: {0}")]
    DegenerateInput(String),
}

impl BeamError {
    /// Create a Config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an InvariantViolation error.
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    /// Create a DegenerateInput error.
    pub fn degenerate(msg: impl Into<String>) -> Self {
        Self::DegenerateInput(msg.into())
    }

    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "ConfigError",
            Self::InvariantViolation(_) => "InvariantViolation",
            Self::DegenerateInput(_) => "DegenerateInputError",
        }
    }
}
