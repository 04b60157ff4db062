//! Function selectors.

use crate::error::{PrimitiveError, PrimitiveResult};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::fmt;

/// Length of a selector in bytes.
pub const SELECTOR_SIZE: usize = 4;

/// First four bytes of the keccak-256 hash of a function signature.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Selector([u8; SELECTOR_SIZE]);

impl Selector {
    /// Creates a selector from raw bytes.
    #[inline]
    #[must_use]
    pub const fn from_array(bytes: [u8; SELECTOR_SIZE]) -> Self {
        Self(bytes)
    }

    /// Derives the selector of a signature such as `"transfer(address,uint256)"`.
    #[must_use]
    pub fn from_signature(signature: &str) -> Self {
        let digest = Keccak256::digest(signature.as_bytes());
        let mut bytes = [0u8; SELECTOR_SIZE];
        bytes.copy_from_slice(&digest[..SELECTOR_SIZE]);
        Self(bytes)
    }

    /// Reads the selector at the start of `calldata`.
    ///
    /// # Errors
    ///
    /// Returns `PrimitiveError::InvalidLength` if fewer than four bytes are available.
    pub fn from_calldata(calldata: &[u8]) -> PrimitiveResult<Self> {
        let head = calldata
            .get(..SELECTOR_SIZE)
            .ok_or_else(|| PrimitiveError::invalid_length(SELECTOR_SIZE, calldata.len()))?;
        let mut bytes = [0u8; SELECTOR_SIZE];
        bytes.copy_from_slice(head);
        Ok(Self(bytes))
    }

    /// Returns the raw bytes.
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; SELECTOR_SIZE] {
        &self.0
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Selector({self})")
    }
}
