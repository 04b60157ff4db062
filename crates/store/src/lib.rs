//! Storage abstractions backing the rexec engine.
//!
//! All application state lives in one flat map keyed by
//! `(ExecutionId, key) -> Word`. Reads of absent keys yield the zero word and
//! writing zero removes a slot, so "never written" and "explicitly zeroed" are
//! indistinguishable.
//!
//! Mutation happens only through [`Store::write_batch`], which applies a
//! [`WriteBatch`] for a single execution id atomically. The engine is the sole
//! caller of that method.

mod batch;
mod error;
mod key;
mod memory;
mod traits;

pub use batch::{BatchOp, WriteBatch};
pub use error::{StoreError, StoreResult};
pub use key::StorageKey;
pub use memory::{MemorySnapshot, MemoryStore};
pub use traits::{ReadStore, Store};
