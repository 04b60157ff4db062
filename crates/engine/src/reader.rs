//! Read-only storage access handed to logic modules.

use rexec_primitives::{Address, ExecutionId, Word};
use rexec_store::ReadStore;

use crate::context::ContextSlot;
use crate::exception::{reasons, ApplicationException};
use crate::keys::KeyBuilder;

/// Longest string [`StorageReader::read_string`] will reassemble.
pub const MAX_STORED_STRING: u64 = 4096;

/// Read accessor bound to one execution id.
///
/// Modules receive this instead of a store handle, so the only partition they
/// can observe is their own and they have no way to write.
#[derive(Clone, Copy)]
pub struct StorageReader<'a> {
    store: &'a dyn ReadStore,
    execution_id: ExecutionId,
}

impl<'a> StorageReader<'a> {
    pub fn new(store: &'a dyn ReadStore, execution_id: ExecutionId) -> Self {
        Self {
            store,
            execution_id,
        }
    }

    pub fn execution_id(&self) -> ExecutionId {
        self.execution_id
    }

    /// Raw slot value; absent slots read as zero.
    pub fn read(&self, key: impl Into<Word>) -> Word {
        self.store.get_slot(self.execution_id, key.into())
    }

    /// Slot value as an integer.
    ///
    /// A stored value wider than 128 bits is reported as `DefaultException`.
    pub fn read_u128(&self, key: impl Into<Word>) -> Result<u128, ApplicationException> {
        self.read(key)
            .as_u128()
            .ok_or_else(|| ApplicationException::new(reasons::DEFAULT_EXCEPTION))
    }

    pub fn read_u64(&self, key: impl Into<Word>) -> Result<u64, ApplicationException> {
        self.read(key)
            .as_u64()
            .ok_or_else(|| ApplicationException::new(reasons::DEFAULT_EXCEPTION))
    }

    pub fn read_address(&self, key: impl Into<Word>) -> Address {
        self.read(key).as_address()
    }

    pub fn read_bool(&self, key: impl Into<Word>) -> bool {
        self.read(key).as_bool()
    }

    /// String written by [`crate::EffectSet::set_string`]: a length slot at
    /// `key` followed by 32-byte chunks at `key.index(i)`.
    pub fn read_string(&self, key: impl Into<Word>) -> Result<String, ApplicationException> {
        let key = key.into();
        let len = self.read_u64(key)?;
        if len > MAX_STORED_STRING {
            return Err(ApplicationException::new(reasons::DEFAULT_EXCEPTION));
        }
        let len = len as usize;
        let mut bytes = Vec::with_capacity(len);
        let mut chunk = 0u64;
        while bytes.len() < len {
            let word = self.read(KeyBuilder::from_key(key).index(chunk));
            let take = (len - bytes.len()).min(word.as_bytes().len());
            bytes.extend_from_slice(&word.as_bytes()[..take]);
            chunk += 1;
        }
        String::from_utf8(bytes).map_err(|_| ApplicationException::new(reasons::DEFAULT_EXCEPTION))
    }

    /// Current instance admin.
    pub fn admin(&self) -> Address {
        self.read_address(ContextSlot::Admin.key())
    }

    pub fn is_admin(&self, address: Address) -> bool {
        !address.is_zero() && self.admin() == address
    }

    pub fn is_initialized(&self) -> bool {
        self.read_bool(ContextSlot::Initialized.key())
    }

    pub fn is_finalized(&self) -> bool {
        self.read_bool(ContextSlot::Finalized.key())
    }

    pub fn created_at(&self) -> u64 {
        self.read(ContextSlot::CreatedAt.key()).as_u64().unwrap_or(0)
    }
}

impl std::fmt::Debug for StorageReader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageReader")
            .field("execution_id", &self.execution_id)
            .finish()
    }
}
