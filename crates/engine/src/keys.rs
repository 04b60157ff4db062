//! Storage key derivation.
//!
//! Slots are addressed by 256-bit keys. Modules derive them from readable
//! labels, then narrow them by address, word or index, each step hashing the
//! previous key together with the new component:
//!
//! ```rust
//! use rexec_engine::KeyBuilder;
//! use rexec_primitives::Address;
//!
//! let holder = Address::from_low_u64(7);
//! let balance = KeyBuilder::new("token.balances").address(holder).build();
//! assert_ne!(balance, KeyBuilder::new("token.balances").build());
//! ```

use rexec_primitives::{Address, Word};

/// Fluent builder for storage keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBuilder {
    current: Word,
}

impl KeyBuilder {
    /// Starts from the keccak hash of `label`.
    #[inline]
    #[must_use]
    pub fn new(label: &str) -> Self {
        Self {
            current: Word::keccak(label.as_bytes()),
        }
    }

    /// Starts from an already derived key.
    #[inline]
    #[must_use]
    pub const fn from_key(base: Word) -> Self {
        Self { current: base }
    }

    /// Narrows the key by a sub-label.
    #[must_use]
    pub fn label(self, label: &str) -> Self {
        self.extend(label.as_bytes())
    }

    /// Narrows the key by an address (mapping lookup).
    #[must_use]
    pub fn address(self, address: Address) -> Self {
        self.extend(Word::from(address).as_bytes())
    }

    /// Narrows the key by a word.
    #[must_use]
    pub fn word(self, word: Word) -> Self {
        self.extend(word.as_bytes())
    }

    /// Narrows the key by a list index.
    #[must_use]
    pub fn index(self, index: u64) -> Self {
        self.extend(Word::from(index).as_bytes())
    }

    /// Returns the derived key.
    #[inline]
    #[must_use]
    pub const fn build(self) -> Word {
        self.current
    }

    fn extend(self, component: &[u8]) -> Self {
        Self {
            current: Word::keccak_concat(&[self.current.as_bytes(), component]),
        }
    }
}

impl From<KeyBuilder> for Word {
    fn from(builder: KeyBuilder) -> Self {
        builder.build()
    }
}
