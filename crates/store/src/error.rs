use thiserror::Error;

/// Errors raised by storage backends.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store: backend failure: {0}")]
    Backend(String),

    #[error("store: batch of {ops} operations exceeds the limit of {limit}")]
    BatchTooLarge { ops: usize, limit: usize },
}

impl StoreError {
    #[inline]
    pub fn backend(message: impl Into<String>) -> Self {
        StoreError::Backend(message.into())
    }
}

/// Result type for storage operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
