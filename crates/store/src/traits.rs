use rexec_primitives::{ExecutionId, Word};

use crate::batch::WriteBatch;
use crate::error::StoreError;
use crate::key::StorageKey;

/// Read access to the slot map.
///
/// Reads never fail: an absent slot is the zero word.
pub trait ReadStore: Send + Sync {
    fn get(&self, key: &StorageKey) -> Word;

    /// All non-zero slots of one partition, ordered by key.
    fn slots(&self, execution_id: ExecutionId) -> Vec<(Word, Word)>;

    #[inline]
    fn get_slot(&self, execution_id: ExecutionId, key: Word) -> Word {
        self.get(&StorageKey::new(execution_id, key))
    }
}

/// Abstraction exposed by storage backends.
pub trait Store: ReadStore {
    /// Applies every operation of `batch` or none of them.
    ///
    /// Returns the number of operations applied.
    fn write_batch(&self, batch: WriteBatch) -> Result<usize, StoreError>;
}
