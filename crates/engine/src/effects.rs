//! Effects returned by logic modules.

use rexec_primitives::{Address, Word, WORD_SIZE};
use serde::{Deserialize, Serialize};

use crate::keys::KeyBuilder;

/// Module-defined event, passed through verbatim by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Indexed topics; by convention the first is the event signature hash.
    pub topics: Vec<Word>,
    /// Opaque payload.
    pub data: Vec<u8>,
}

impl Event {
    pub fn new(topics: Vec<Word>, data: Vec<u8>) -> Self {
        Self { topics, data }
    }

    /// Event whose first topic is the keccak hash of `signature`.
    pub fn named(signature: &str, mut topics: Vec<Word>, data: Vec<u8>) -> Self {
        topics.insert(0, Word::keccak(signature.as_bytes()));
        Self { topics, data }
    }
}

/// One slot write inside the caller's execution id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageWrite {
    pub key: Word,
    pub value: Word,
}

/// Value to deliver to an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub destination: Address,
    pub amount: u128,
}

/// Storage writes, events and payments computed for one call.
///
/// The engine applies the whole set or none of it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectSet {
    events: Vec<Event>,
    storage_writes: Vec<StorageWrite>,
    payments: Vec<Payment>,
}

impl EffectSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a storage write. Later writes to the same key win.
    pub fn set(&mut self, key: Word, value: impl Into<Word>) -> &mut Self {
        self.storage_writes.push(StorageWrite {
            key,
            value: value.into(),
        });
        self
    }

    /// Queues a string as a length slot at `key` plus 32-byte chunks at
    /// `key.index(i)`.
    pub fn set_string(&mut self, key: Word, value: &str) -> &mut Self {
        self.set(key, value.len() as u64);
        for (i, chunk) in value.as_bytes().chunks(WORD_SIZE).enumerate() {
            let mut bytes = [0u8; WORD_SIZE];
            bytes[..chunk.len()].copy_from_slice(chunk);
            self.set(
                KeyBuilder::from_key(key).index(i as u64).build(),
                Word::from_array(bytes),
            );
        }
        self
    }

    /// Queues an event.
    pub fn emit(&mut self, event: Event) -> &mut Self {
        self.events.push(event);
        self
    }

    /// Queues a payment.
    pub fn pay(&mut self, destination: Address, amount: u128) -> &mut Self {
        self.payments.push(Payment {
            destination,
            amount,
        });
        self
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn storage_writes(&self) -> &[StorageWrite] {
        &self.storage_writes
    }

    pub fn payments(&self) -> &[Payment] {
        &self.payments
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.storage_writes.is_empty() && self.payments.is_empty()
    }

    /// Value written to `key` by this set, if any.
    pub fn pending(&self, key: Word) -> Option<Word> {
        self.storage_writes
            .iter()
            .rev()
            .find(|write| write.key == key)
            .map(|write| write.value)
    }

    pub(crate) fn into_parts(self) -> (Vec<Event>, Vec<StorageWrite>, Vec<Payment>) {
        (self.events, self.storage_writes, self.payments)
    }
}

/// What a committed call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExecCounts {
    /// Module events emitted.
    pub events: usize,
    /// Payments delivered.
    pub payments: usize,
    /// Storage slots written.
    pub writes: usize,
}

impl ExecCounts {
    /// True for the outcome of an application exception.
    pub fn is_zero(&self) -> bool {
        self.events == 0 && self.payments == 0 && self.writes == 0
    }
}
