//! Notifications emitted by the engine.

use rexec_primitives::{Address, ExecutionId};
use serde::Serialize;

use crate::effects::Event;

/// Observable outcome of an engine call, in emission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum Notification {
    /// A new instance was created.
    ApplicationInitialized {
        execution_id: ExecutionId,
        implementation: Address,
        admin: Address,
        registry_id: ExecutionId,
    },
    /// A call committed its effects. Always the last notification of a call.
    ApplicationExecution {
        execution_id: ExecutionId,
        implementation: Address,
    },
    /// A module rejected a call; nothing was applied.
    ApplicationException {
        execution_id: ExecutionId,
        implementation: Address,
        reason: String,
    },
    /// An application version was marked final in a registry.
    ApplicationFinalization {
        execution_id: ExecutionId,
        implementation: Address,
    },
    DeliveredPayment {
        execution_id: ExecutionId,
        destination: Address,
        amount: u128,
    },
    /// Module-defined event, passed through verbatim.
    Module {
        execution_id: ExecutionId,
        event: Event,
    },
}

impl Notification {
    pub fn execution_id(&self) -> ExecutionId {
        match self {
            Notification::ApplicationInitialized { execution_id, .. }
            | Notification::ApplicationExecution { execution_id, .. }
            | Notification::ApplicationException { execution_id, .. }
            | Notification::ApplicationFinalization { execution_id, .. }
            | Notification::DeliveredPayment { execution_id, .. }
            | Notification::Module { execution_id, .. } => *execution_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Notification::ApplicationInitialized { .. } => "ApplicationInitialized",
            Notification::ApplicationExecution { .. } => "ApplicationExecution",
            Notification::ApplicationException { .. } => "ApplicationException",
            Notification::ApplicationFinalization { .. } => "ApplicationFinalization",
            Notification::DeliveredPayment { .. } => "DeliveredPayment",
            Notification::Module { .. } => "Module",
        }
    }

    /// Reason carried by an `ApplicationException`.
    pub fn exception_reason(&self) -> Option<&str> {
        match self {
            Notification::ApplicationException { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_with_type_tag() {
        let notification = Notification::DeliveredPayment {
            execution_id: ExecutionId::derive(&[b"x"]),
            destination: Address::from_low_u64(1),
            amount: 5,
        };
        let json = serde_json::to_value(&notification).unwrap();
        assert_eq!(json["type"], "DeliveredPayment");
        assert_eq!(json["amount"], 5);
        assert_eq!(notification.name(), "DeliveredPayment");
        assert_eq!(notification.exception_reason(), None);
    }

    #[test]
    fn test_exception_reason() {
        let notification = Notification::ApplicationException {
            execution_id: ExecutionId::derive(&[b"x"]),
            implementation: Address::from_low_u64(2),
            reason: "InvalidAmt".into(),
        };
        assert_eq!(notification.exception_reason(), Some("InvalidAmt"));
    }
}
