use rexec_primitives::{ExecutionId, Word};

/// Operation to be applied via a write batch.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum BatchOp {
    Put { key: Word, value: Word },
    Delete { key: Word },
}

impl BatchOp {
    /// Slot touched by this operation.
    #[inline]
    pub fn key(&self) -> Word {
        match self {
            BatchOp::Put { key, .. } | BatchOp::Delete { key } => *key,
        }
    }
}

/// Ordered set of operations on one execution id, applied atomically.
///
/// A batch is bound to a single partition at construction, so a commit can
/// never spill into another execution id's key space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteBatch {
    execution_id: ExecutionId,
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    #[inline]
    pub fn new(execution_id: ExecutionId) -> Self {
        Self {
            execution_id,
            ops: Vec::new(),
        }
    }

    #[inline]
    pub fn with_capacity(execution_id: ExecutionId, capacity: usize) -> Self {
        Self {
            execution_id,
            ops: Vec::with_capacity(capacity),
        }
    }

    /// Queues a write. A zero value is recorded as a delete.
    #[inline]
    pub fn put(&mut self, key: Word, value: Word) {
        if value.is_zero() {
            self.ops.push(BatchOp::Delete { key });
        } else {
            self.ops.push(BatchOp::Put { key, value });
        }
    }

    #[inline]
    pub fn delete(&mut self, key: Word) {
        self.ops.push(BatchOp::Delete { key });
    }

    #[inline]
    pub fn execution_id(&self) -> ExecutionId {
        self.execution_id
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    #[inline]
    pub fn operations(&self) -> &[BatchOp] {
        &self.ops
    }

    #[inline]
    pub fn into_ops(self) -> Vec<BatchOp> {
        self.ops
    }
}
