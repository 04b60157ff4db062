//! Error types for primitive conversions.

use thiserror::Error;

/// Errors raised while building or converting primitive values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PrimitiveError {
    /// Input had the wrong byte length.
    #[error("Invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// Required length.
        expected: usize,
        /// Supplied length.
        actual: usize,
    },

    /// Input was not valid hexadecimal.
    #[error("Invalid hex: {message}")]
    InvalidHex {
        /// Error message.
        message: String,
    },

    /// Value does not fit in the target representation.
    #[error("Value out of range: {message}")]
    OutOfRange {
        /// Error message.
        message: String,
    },

    /// Execution ids are never zero.
    #[error("Execution id cannot be zero")]
    ZeroExecutionId,
}

impl PrimitiveError {
    /// Create an invalid length error.
    pub fn invalid_length(expected: usize, actual: usize) -> Self {
        Self::InvalidLength { expected, actual }
    }

    /// Create an invalid hex error.
    pub fn invalid_hex<S: Into<String>>(message: S) -> Self {
        Self::InvalidHex {
            message: message.into(),
        }
    }

    /// Create an out of range error.
    pub fn out_of_range<S: Into<String>>(message: S) -> Self {
        Self::OutOfRange {
            message: message.into(),
        }
    }
}

/// Result type for primitive operations.
pub type PrimitiveResult<T> = std::result::Result<T, PrimitiveError>;
