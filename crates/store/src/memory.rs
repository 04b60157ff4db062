use hashbrown::HashMap;
use parking_lot::RwLock;
use rexec_primitives::{ExecutionId, Word};
use tracing::trace;

use crate::batch::{BatchOp, WriteBatch};
use crate::error::StoreError;
use crate::key::StorageKey;
use crate::traits::{ReadStore, Store};

/// In-memory slot map used by tests and deterministic simulations.
#[derive(Default)]
pub struct MemoryStore {
    slots: RwLock<HashMap<StorageKey, Word>>,
    batch_limit: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            batch_limit: None,
        }
    }

    /// Store that rejects batches larger than `limit` operations.
    pub fn with_batch_limit(limit: usize) -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            batch_limit: Some(limit),
        }
    }

    /// Number of non-zero slots across all partitions.
    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }

    /// Point-in-time copy of every slot.
    pub fn snapshot(&self) -> MemorySnapshot {
        MemorySnapshot {
            slots: self.slots.read().clone(),
        }
    }
}

impl ReadStore for MemoryStore {
    fn get(&self, key: &StorageKey) -> Word {
        self.slots.read().get(key).copied().unwrap_or(Word::ZERO)
    }

    fn slots(&self, execution_id: ExecutionId) -> Vec<(Word, Word)> {
        collect_partition(&self.slots.read(), execution_id)
    }
}

impl Store for MemoryStore {
    fn write_batch(&self, batch: WriteBatch) -> Result<usize, StoreError> {
        if let Some(limit) = self.batch_limit {
            if batch.len() > limit {
                return Err(StoreError::BatchTooLarge {
                    ops: batch.len(),
                    limit,
                });
            }
        }

        let execution_id = batch.execution_id();
        let mut slots = self.slots.write();
        let mut applied = 0;
        for op in batch.into_ops() {
            match op {
                BatchOp::Put { key, value } => {
                    slots.insert(StorageKey::new(execution_id, key), value);
                }
                BatchOp::Delete { key } => {
                    slots.remove(&StorageKey::new(execution_id, key));
                }
            }
            applied += 1;
        }
        trace!(%execution_id, applied, "applied write batch");
        Ok(applied)
    }
}

/// Immutable copy of a [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemorySnapshot {
    slots: HashMap<StorageKey, Word>,
}

impl MemorySnapshot {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl ReadStore for MemorySnapshot {
    fn get(&self, key: &StorageKey) -> Word {
        self.slots.get(key).copied().unwrap_or(Word::ZERO)
    }

    fn slots(&self, execution_id: ExecutionId) -> Vec<(Word, Word)> {
        collect_partition(&self.slots, execution_id)
    }
}

fn collect_partition(
    slots: &HashMap<StorageKey, Word>,
    execution_id: ExecutionId,
) -> Vec<(Word, Word)> {
    let mut entries: Vec<(Word, Word)> = slots
        .iter()
        .filter(|(key, _)| key.execution_id() == execution_id)
        .map(|(key, value)| (key.key(), *value))
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries
}
