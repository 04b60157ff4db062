use rexec_primitives::{ExecutionId, Word};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Fully qualified storage key: a slot `key` inside the partition of one
/// execution id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageKey {
    execution_id: ExecutionId,
    key: Word,
}

impl StorageKey {
    /// Creates a new storage key.
    pub fn new(execution_id: ExecutionId, key: Word) -> Self {
        Self { execution_id, key }
    }

    /// Returns the partition this key belongs to.
    pub fn execution_id(&self) -> ExecutionId {
        self.execution_id
    }

    /// Returns the slot key inside the partition.
    pub fn key(&self) -> Word {
        self.key
    }
}

impl PartialOrd for StorageKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for StorageKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.execution_id.cmp(&other.execution_id) {
            Ordering::Equal => self.key.cmp(&other.key),
            other => other,
        }
    }
}
