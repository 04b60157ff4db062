//! Execution identifiers.

use crate::error::{PrimitiveError, PrimitiveResult};
use crate::word::{Word, WORD_SIZE};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Opaque, non-zero identifier of one application instance.
///
/// An execution id is the partition key of the storage space: every slot is
/// addressed by `(ExecutionId, key)`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExecutionId(Word);

impl ExecutionId {
    /// Wraps a word.
    ///
    /// # Errors
    ///
    /// Returns `PrimitiveError::ZeroExecutionId` for the zero word.
    pub fn new(word: Word) -> PrimitiveResult<Self> {
        if word.is_zero() {
            return Err(PrimitiveError::ZeroExecutionId);
        }
        Ok(Self(word))
    }

    /// Derives an id as sha-256 over the concatenated `parts`.
    ///
    /// The 0xFF domain byte keeps derived ids apart from raw keccak storage keys.
    #[must_use]
    pub fn derive(parts: &[&[u8]]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update([0xFF]);
        for part in parts {
            hasher.update((part.len() as u32).to_be_bytes());
            hasher.update(part);
        }
        let mut bytes: [u8; WORD_SIZE] = hasher.finalize().into();
        if bytes.iter().all(|b| *b == 0) {
            bytes[WORD_SIZE - 1] = 1;
        }
        Self(Word::from_array(bytes))
    }

    /// Returns the underlying word.
    #[inline]
    #[must_use]
    pub const fn as_word(&self) -> Word {
        self.0
    }
}

impl From<ExecutionId> for Word {
    fn from(value: ExecutionId) -> Self {
        value.0
    }
}

impl TryFrom<Word> for ExecutionId {
    type Error = PrimitiveError;

    fn try_from(value: Word) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.0.to_string();
        // 0x + first 8 hex digits is enough to tell instances apart in logs.
        write!(f, "ExecutionId({}..)", &text[..10])
    }
}
