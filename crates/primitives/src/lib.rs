//! # rexec Primitives
//!
//! Fundamental types shared by every rexec crate.
//!
//! - [`Word`]: 256-bit big-endian value, the unit of storage keys and values
//! - [`Address`]: 160-bit account or module address
//! - [`ExecutionId`]: non-zero identifier of one application instance
//! - [`Selector`]: 4-byte function selector derived from a signature
//!
//! ## Design Principles
//!
//! - **Zero dependencies on other rexec-* crates**
//! - **Fixed-size, `Copy` types** that hash and order cheaply
//!
//! ## Example
//!
//! ```rust
//! use rexec_primitives::{Address, Selector, Word};
//!
//! let word = Word::from(1_000u64);
//! assert_eq!(word.as_u128(), Some(1_000));
//!
//! let owner: Address = "0x00000000000000000000000000000000000000aa".parse().unwrap();
//! assert_eq!(Word::from(owner).as_address(), owner);
//!
//! let transfer = Selector::from_signature("transfer(address,uint256)");
//! assert_eq!(transfer.to_string(), "0xa9059cbb");
//! ```

pub mod address;
pub mod error;
pub mod execution_id;
pub mod selector;
pub mod word;

// Re-exports
pub use address::{Address, ADDRESS_SIZE};
pub use error::{PrimitiveError, PrimitiveResult};
pub use execution_id::ExecutionId;
pub use selector::{Selector, SELECTOR_SIZE};
pub use word::{Word, WORD_SIZE};

/// Strips an optional `0x`/`0X` prefix from a hex string.
pub(crate) fn strip_hex_prefix(value: &str) -> &str {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value)
}
