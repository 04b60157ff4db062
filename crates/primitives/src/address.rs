//! Implementation of `Address`, a 160-bit account or module address.

use crate::error::{PrimitiveError, PrimitiveResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The length of `Address` values in bytes.
pub const ADDRESS_SIZE: usize = 20;

/// A 160-bit address identifying a caller, an admin or an implementation module.
///
/// The zero address means "none": the registry returns it for unbound selectors.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address([u8; ADDRESS_SIZE]);

impl Address {
    /// Alias for the byte length.
    pub const LENGTH: usize = ADDRESS_SIZE;

    /// Returns the zero address.
    #[inline]
    #[must_use]
    pub const fn zero() -> Self {
        Self([0u8; ADDRESS_SIZE])
    }

    /// Creates an address from a fixed array.
    #[inline]
    #[must_use]
    pub const fn from_array(bytes: [u8; ADDRESS_SIZE]) -> Self {
        Self(bytes)
    }

    /// Creates an address from a byte slice.
    ///
    /// # Errors
    ///
    /// Returns `PrimitiveError::InvalidLength` unless the slice is exactly 20 bytes.
    pub fn from_slice(value: &[u8]) -> PrimitiveResult<Self> {
        let bytes: [u8; ADDRESS_SIZE] = value
            .try_into()
            .map_err(|_| PrimitiveError::invalid_length(ADDRESS_SIZE, value.len()))?;
        Ok(Self(bytes))
    }

    /// Creates an address whose low eight bytes hold `value`.
    ///
    /// Handy for fixtures and well-known module addresses.
    #[must_use]
    pub fn from_low_u64(value: u64) -> Self {
        let mut bytes = [0u8; ADDRESS_SIZE];
        bytes[ADDRESS_SIZE - 8..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }

    /// Checks if this is the zero address.
    #[inline]
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// Returns the underlying bytes.
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; ADDRESS_SIZE] {
        &self.0
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = PrimitiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = crate::strip_hex_prefix(s);
        let raw = hex::decode(digits).map_err(|e| PrimitiveError::invalid_hex(e.to_string()))?;
        Self::from_slice(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero() {
        assert!(Address::zero().is_zero());
        assert_eq!(Address::default(), Address::zero());
        assert!(!Address::from_low_u64(1).is_zero());
    }

    #[test]
    fn test_parse_with_and_without_prefix() {
        let a: Address = "0x00000000000000000000000000000000000000ff".parse().unwrap();
        let b: Address = "00000000000000000000000000000000000000ff".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a, Address::from_low_u64(0xff));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(
            "0x1234".parse::<Address>(),
            Err(PrimitiveError::InvalidLength { expected: 20, actual: 2 })
        ));
        assert!(matches!(
            "0xzz".parse::<Address>(),
            Err(PrimitiveError::InvalidHex { .. })
        ));
    }

    #[test]
    fn test_display_round_trip() {
        let address = Address::from_low_u64(0xdead_beef);
        let text = address.to_string();
        assert_eq!(text.len(), 2 + ADDRESS_SIZE * 2);
        assert_eq!(text.parse::<Address>().unwrap(), address);
    }
}
