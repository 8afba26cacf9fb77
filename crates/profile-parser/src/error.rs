//! Error types for profile parsing operations.

use beam_common::BeamError;
use thiserror::Error;

/// Result type for profile parser operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Error types for profile parsing.
#[derive(Error, Debug)]
pub enum ParseError {
    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The header row is missing or a required field is absent or invalid
    #[error("Malformed header: {0}")]
    MalformedHeader(String),

    /// The sample grid does not match the header's pixel counts
    #[error("Shape mismatch: header declares {expected_rows}x{expected_cols}, file has {rows}x{cols}")]
    ShapeMismatch {
        expected_rows: i64,
        expected_cols: i64,
        rows: usize,
        cols: usize,
    },

    /// Header values violate a beam invariant
    #[error(transparent)]
    Beam(#[from] BeamError),
}
