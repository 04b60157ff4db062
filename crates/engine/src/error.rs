//! Engine-fatal errors.
//!
//! Every variant aborts the call with no state change. Business-rule
//! rejections raised by logic modules are not errors at this level; see
//! [`crate::ApplicationException`].

use rexec_primitives::{Address, ExecutionId, Selector, Word};
use rexec_store::StoreError;
use thiserror::Error;

/// Errors that abort an engine call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// An application with this name already exists in the registry.
    #[error("Duplicate application name: {0}")]
    DuplicateName(String),

    /// Selector and implementation arrays differ in length.
    #[error("Array length mismatch: {selectors} selectors, {implementations} implementations")]
    ArrayLenMismatch {
        /// Number of selectors supplied.
        selectors: usize,
        /// Number of implementations supplied.
        implementations: usize,
    },

    /// Selector list was empty.
    #[error("Empty selector array")]
    EmptyArray,

    /// The same selector appears twice in one version.
    #[error("Duplicate selector {0}")]
    DuplicateSelector(Selector),

    /// An implementation was registered under the zero address.
    #[error("Invalid implementation address for selector {0}")]
    InvalidImplementation(Selector),

    /// No application with this name is registered.
    #[error("Invalid application: {0}")]
    InvalidApplication(String),

    /// No registry exists under this id.
    #[error("Unknown registry: {0}")]
    UnknownRegistry(ExecutionId),

    /// Only a registry's provider may change it.
    #[error("Sender {sender} is not the provider of registry {registry}")]
    NotRegistryProvider {
        /// Caller.
        sender: Address,
        /// Registry addressed.
        registry: ExecutionId,
    },

    /// The application has no such version.
    #[error("Unknown version {version} of application {application}")]
    UnknownVersion {
        /// Application name.
        application: String,
        /// Requested version.
        version: u32,
    },

    /// The version is already final.
    #[error("Version {version} of application {application} is already finalized")]
    VersionAlreadyFinalized {
        /// Application name.
        application: String,
        /// Version number.
        version: u32,
    },

    /// No instance exists under this id.
    #[error("Unknown execution id: {0}")]
    UnknownExecutionId(ExecutionId),

    /// The selector has no binding in the resolved selector table.
    #[error("Unknown selector {selector} for application {application}")]
    UnknownSelector {
        /// Application name.
        application: String,
        /// Selector dispatched.
        selector: Selector,
    },

    /// Calldata too short to carry a selector.
    #[error("Malformed calldata: {len} bytes")]
    MalformedCalldata {
        /// Calldata length.
        len: usize,
    },

    /// A write was not authorized for the dispatched implementation.
    #[error("Unauthorized write by {implementation} to slot {key}")]
    UnauthorizedWrite {
        /// Implementation that produced the write.
        implementation: Address,
        /// Slot it attempted to write.
        key: Word,
    },

    /// A write would clear a lifecycle flag that is already set.
    #[error("Lifecycle flag {slot} cannot be cleared")]
    LifecycleRegression {
        /// Flag label.
        slot: &'static str,
    },

    /// Caller is not the instance admin.
    #[error("Sender {sender} is not the admin of {execution_id}")]
    NotAdmin {
        /// Caller.
        sender: Address,
        /// Instance addressed.
        execution_id: ExecutionId,
    },

    /// The zero address cannot administer an instance.
    #[error("Invalid admin address")]
    InvalidAdmin,

    /// Payments exceed the value attached to the call.
    #[error("Insufficient value: payments require {required}, {attached} attached")]
    InsufficientValue {
        /// Sum of payments.
        required: u128,
        /// Value attached to the call.
        attached: u128,
    },

    /// A payment targets the zero address or overflows.
    #[error("Invalid payment to {0}")]
    InvalidPayment(Address),

    /// An effect set exceeds a configured limit.
    #[error("Too many {kind}: {count} exceeds limit {limit}")]
    EffectLimitExceeded {
        /// Kind of effect.
        kind: &'static str,
        /// Count produced.
        count: usize,
        /// Configured limit.
        limit: usize,
    },

    /// The init module rejected the init calldata.
    #[error("Invalid init calldata: {0}")]
    InvalidInitCalldata(String),

    /// Storage backend error.
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl EngineError {
    /// Create an unknown selector error.
    pub fn unknown_selector<S: Into<String>>(application: S, selector: Selector) -> Self {
        Self::UnknownSelector {
            application: application.into(),
            selector,
        }
    }

    /// Create an unknown version error.
    pub fn unknown_version<S: Into<String>>(application: S, version: u32) -> Self {
        Self::UnknownVersion {
            application: application.into(),
            version,
        }
    }

    /// Create an effect limit error.
    pub fn limit(kind: &'static str, count: usize, limit: usize) -> Self {
        Self::EffectLimitExceeded { kind, count, limit }
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_len_mismatch_message() {
        let err = EngineError::ArrayLenMismatch {
            selectors: 3,
            implementations: 2,
        };
        assert_eq!(
            err.to_string(),
            "Array length mismatch: 3 selectors, 2 implementations"
        );
    }

    #[test]
    fn test_store_error_conversion() {
        let err: EngineError = StoreError::backend("disk gone").into();
        assert!(matches!(err, EngineError::Store(_)));
        assert!(err.to_string().contains("disk gone"));
    }

    #[test]
    fn test_limit_helper() {
        let err = EngineError::limit("events", 70, 64);
        assert_eq!(err.to_string(), "Too many events: 70 exceeds limit 64");
    }
}
