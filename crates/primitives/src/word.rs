//! Implementation of `Word`, a 256-bit big-endian value.

use crate::address::{Address, ADDRESS_SIZE};
use crate::error::{PrimitiveError, PrimitiveResult};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;

/// The length of `Word` values in bytes.
pub const WORD_SIZE: usize = 32;

/// A 256-bit value stored big-endian.
///
/// Every storage key and every storage value is a `Word`. Integers are
/// right-aligned, addresses occupy the low 20 bytes and short strings are
/// left-aligned and zero padded.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Word([u8; WORD_SIZE]);

impl Word {
    /// Alias for the byte length.
    pub const LENGTH: usize = WORD_SIZE;

    /// The zero word.
    pub const ZERO: Word = Word([0u8; WORD_SIZE]);

    /// The word holding integer one.
    pub const ONE: Word = {
        let mut bytes = [0u8; WORD_SIZE];
        bytes[WORD_SIZE - 1] = 1;
        Word(bytes)
    };

    /// Creates a word from a fixed array.
    #[inline]
    #[must_use]
    pub const fn from_array(bytes: [u8; WORD_SIZE]) -> Self {
        Self(bytes)
    }

    /// Creates a word from a byte slice.
    ///
    /// # Errors
    ///
    /// Returns `PrimitiveError::InvalidLength` unless the slice is exactly 32 bytes.
    pub fn from_slice(value: &[u8]) -> PrimitiveResult<Self> {
        let bytes: [u8; WORD_SIZE] = value
            .try_into()
            .map_err(|_| PrimitiveError::invalid_length(WORD_SIZE, value.len()))?;
        Ok(Self(bytes))
    }

    /// Returns the underlying bytes.
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; WORD_SIZE] {
        &self.0
    }

    /// Returns an owned copy of the underlying bytes.
    #[inline]
    #[must_use]
    pub const fn to_array(self) -> [u8; WORD_SIZE] {
        self.0
    }

    /// Checks whether every byte is zero.
    #[inline]
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// Returns the value as `u128` if the upper 16 bytes are zero.
    #[must_use]
    pub fn as_u128(&self) -> Option<u128> {
        if self.0[..16].iter().any(|b| *b != 0) {
            return None;
        }
        let mut low = [0u8; 16];
        low.copy_from_slice(&self.0[16..]);
        Some(u128::from_be_bytes(low))
    }

    /// Returns the value as `u64` if it fits.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        self.as_u128().and_then(|v| u64::try_from(v).ok())
    }

    /// Interprets the word as a flag: any non-zero word is `true`.
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> bool {
        !self.is_zero()
    }

    /// Returns the address held in the low 20 bytes.
    #[must_use]
    pub fn as_address(&self) -> Address {
        let mut bytes = [0u8; ADDRESS_SIZE];
        bytes.copy_from_slice(&self.0[WORD_SIZE - ADDRESS_SIZE..]);
        Address::from_array(bytes)
    }

    /// Packs a short ASCII/UTF-8 string (at most 32 bytes) left-aligned.
    ///
    /// # Errors
    ///
    /// Returns `PrimitiveError::OutOfRange` when the string is longer than 32 bytes.
    pub fn from_short_string(value: &str) -> PrimitiveResult<Self> {
        let raw = value.as_bytes();
        if raw.len() > WORD_SIZE {
            return Err(PrimitiveError::out_of_range(format!(
                "string of {} bytes does not fit in a word",
                raw.len()
            )));
        }
        let mut bytes = [0u8; WORD_SIZE];
        bytes[..raw.len()].copy_from_slice(raw);
        Ok(Self(bytes))
    }

    /// Unpacks a left-aligned short string, dropping trailing zero bytes.
    #[must_use]
    pub fn to_short_string(&self) -> String {
        let end = self
            .0
            .iter()
            .rposition(|b| *b != 0)
            .map_or(0, |pos| pos + 1);
        String::from_utf8_lossy(&self.0[..end]).into_owned()
    }

    /// Keccak-256 of `data`.
    #[must_use]
    pub fn keccak(data: &[u8]) -> Self {
        Self(Keccak256::digest(data).into())
    }

    /// Keccak-256 of the concatenation of `parts`.
    #[must_use]
    pub fn keccak_concat(parts: &[&[u8]]) -> Self {
        let mut hasher = Keccak256::new();
        for part in parts {
            hasher.update(part);
        }
        Self(hasher.finalize().into())
    }
}

impl From<u64> for Word {
    fn from(value: u64) -> Self {
        Self::from(u128::from(value))
    }
}

impl From<u128> for Word {
    fn from(value: u128) -> Self {
        let mut bytes = [0u8; WORD_SIZE];
        bytes[16..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }
}

impl From<bool> for Word {
    fn from(value: bool) -> Self {
        if value {
            Self::ONE
        } else {
            Self::ZERO
        }
    }
}

impl From<Address> for Word {
    fn from(value: Address) -> Self {
        let mut bytes = [0u8; WORD_SIZE];
        bytes[WORD_SIZE - ADDRESS_SIZE..].copy_from_slice(value.as_bytes());
        Self(bytes)
    }
}

impl From<[u8; WORD_SIZE]> for Word {
    fn from(value: [u8; WORD_SIZE]) -> Self {
        Self(value)
    }
}

impl AsRef<[u8]> for Word {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_u64() {
            Some(small) => write!(f, "Word({small})"),
            None => write!(f, "Word({self})"),
        }
    }
}

impl FromStr for Word {
    type Err = PrimitiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = crate::strip_hex_prefix(s);
        let raw = hex::decode(digits).map_err(|e| PrimitiveError::invalid_hex(e.to_string()))?;
        Self::from_slice(&raw)
    }
}
