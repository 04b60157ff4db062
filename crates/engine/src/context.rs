//! Execution contexts and their reserved slots.

use rexec_primitives::{Address, ExecutionId, Word};
use serde::Serialize;

use crate::keys::KeyBuilder;

/// Engine-reserved slots present in every execution id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextSlot {
    /// Address allowed to perform privileged transitions.
    Admin,
    /// Application-defined "initialized" flag.
    Initialized,
    /// Application-defined "finalized" flag.
    Finalized,
    /// Creation timestamp.
    CreatedAt,
}

impl ContextSlot {
    pub const ALL: [ContextSlot; 4] = [
        ContextSlot::Admin,
        ContextSlot::Initialized,
        ContextSlot::Finalized,
        ContextSlot::CreatedAt,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ContextSlot::Admin => "rexec.context.admin",
            ContextSlot::Initialized => "rexec.context.initialized",
            ContextSlot::Finalized => "rexec.context.finalized",
            ContextSlot::CreatedAt => "rexec.context.created_at",
        }
    }

    /// Storage key of the slot.
    pub fn key(self) -> Word {
        KeyBuilder::new(self.label()).build()
    }

    /// Reserved slot stored under `key`, if any.
    pub fn from_key(key: Word) -> Option<Self> {
        Self::ALL.into_iter().find(|slot| slot.key() == key)
    }

    /// Only the engine may write these.
    pub const fn engine_owned(self) -> bool {
        matches!(self, ContextSlot::Admin | ContextSlot::CreatedAt)
    }

    /// One-way status flags.
    pub const fn is_flag(self) -> bool {
        matches!(self, ContextSlot::Initialized | ContextSlot::Finalized)
    }
}

/// Coarse lifecycle derived from the two status flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Lifecycle {
    Created,
    Initialized,
    Finalized,
}

/// Per-instance record kept by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionContext {
    pub(crate) execution_id: ExecutionId,
    pub(crate) registry_id: ExecutionId,
    pub(crate) application: String,
    pub(crate) version: u32,
    pub(crate) pinned_version: u32,
    pub(crate) admin: Address,
    pub(crate) initialized: bool,
    pub(crate) finalized: bool,
    pub(crate) created_at: u64,
}

impl ExecutionContext {
    pub fn execution_id(&self) -> ExecutionId {
        self.execution_id
    }

    /// Registry the instance was created from.
    pub fn registry_id(&self) -> ExecutionId {
        self.registry_id
    }

    pub fn application(&self) -> &str {
        &self.application
    }

    /// Application version current at creation.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Version used for dispatch under the pinned policy.
    pub fn pinned_version(&self) -> u32 {
        self.pinned_version
    }

    pub fn admin(&self) -> Address {
        self.admin
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    pub fn lifecycle(&self) -> Lifecycle {
        if self.finalized {
            Lifecycle::Finalized
        } else if self.initialized {
            Lifecycle::Initialized
        } else {
            Lifecycle::Created
        }
    }

    /// Applies a committed write to the cached flags. Flags only move forward.
    pub(crate) fn observe_write(&mut self, key: Word, value: Word) {
        match ContextSlot::from_key(key) {
            Some(ContextSlot::Initialized) => self.initialized |= value.as_bool(),
            Some(ContextSlot::Finalized) => self.finalized |= value.as_bool(),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> ExecutionContext {
        ExecutionContext {
            execution_id: ExecutionId::derive(&[b"ctx"]),
            registry_id: ExecutionId::derive(&[b"reg"]),
            application: "Counter".into(),
            version: 1,
            pinned_version: 1,
            admin: Address::from_low_u64(1),
            initialized: false,
            finalized: false,
            created_at: 10,
        }
    }

    #[test]
    fn test_slot_keys_are_distinct() {
        let keys: Vec<Word> = ContextSlot::ALL.iter().map(|s| s.key()).collect();
        for (i, a) in keys.iter().enumerate() {
            for b in &keys[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(
            ContextSlot::from_key(ContextSlot::Finalized.key()),
            Some(ContextSlot::Finalized)
        );
        assert_eq!(ContextSlot::from_key(Word::ONE), None);
    }

    #[test]
    fn test_ownership() {
        assert!(ContextSlot::Admin.engine_owned());
        assert!(ContextSlot::CreatedAt.engine_owned());
        assert!(!ContextSlot::Initialized.engine_owned());
        assert!(ContextSlot::Finalized.is_flag());
    }

    #[test]
    fn test_flags_only_move_forward() {
        let mut ctx = context();
        assert_eq!(ctx.lifecycle(), Lifecycle::Created);

        ctx.observe_write(ContextSlot::Initialized.key(), Word::ONE);
        assert_eq!(ctx.lifecycle(), Lifecycle::Initialized);

        ctx.observe_write(ContextSlot::Initialized.key(), Word::ZERO);
        assert!(ctx.is_initialized());

        ctx.observe_write(ContextSlot::Finalized.key(), Word::ONE);
        assert_eq!(ctx.lifecycle(), Lifecycle::Finalized);
    }
}
