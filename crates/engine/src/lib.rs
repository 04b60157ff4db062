//! # rexec Engine
//!
//! Application registry and delegated-execution engine.
//!
//! Applications are registered as named tables mapping function selectors to
//! logic modules. Instances of an application live under their own
//! [`ExecutionId`] partition of one shared key/value store. Calls are routed
//! to the bound module, which computes an [`EffectSet`] read-only; the engine
//! validates it and applies it atomically.
//!
//! ```text
//! caller ──► ExecutionEngine::exec ──► ApplicationRegistry::resolve
//!                  │                              │
//!                  │          Binding ◄───────────┘
//!                  ▼
//!          LogicModule::execute(StorageReader, calldata)
//!                  │
//!       Ok(EffectSet) │ Err(ApplicationException)
//!                  ▼
//!        plan_commit ──► Store::write_batch ──► Notifications
//! ```
//!
//! ## Outcomes
//!
//! - `Ok(counts)` with an `ApplicationExecution` notification: effects applied.
//! - `Ok(ExecCounts::default())` with an `ApplicationException` notification:
//!   the module rejected the call and nothing changed.
//! - `Err(EngineError)`: the call did not happen.
//!
//! [`ExecutionId`]: rexec_primitives::ExecutionId

pub mod calldata;
pub mod clock;
pub mod context;
pub mod effects;
pub mod engine;
pub mod error;
pub mod exception;
pub mod keys;
pub mod module;
pub mod notification;
pub mod reader;
pub mod registry;
pub mod reservations;

// Re-exports
pub use calldata::{ArgReader, CalldataBuilder, DecodeError};
pub use clock::{Clock, ManualClock, SystemClock};
pub use context::{ContextSlot, ExecutionContext, Lifecycle};
pub use effects::{EffectSet, Event, ExecCounts, Payment, StorageWrite};
pub use engine::ExecutionEngine;
pub use error::{EngineError, EngineResult};
pub use exception::{ensure, reasons, ApplicationException, ModuleResult};
pub use keys::KeyBuilder;
pub use module::{Binding, LogicModule, ModuleCall};
pub use notification::Notification;
pub use reader::StorageReader;
pub use registry::{AppVersion, Application, ApplicationRegistry};
pub use reservations::{Reservation, ReservationBook, ReservationLayout};

/// Items most logic modules need.
pub mod prelude {
    pub use crate::calldata::{ArgReader, CalldataBuilder};
    pub use crate::effects::{EffectSet, Event};
    pub use crate::exception::{ensure, reasons, ApplicationException, ModuleResult};
    pub use crate::keys::KeyBuilder;
    pub use crate::module::{Binding, LogicModule, ModuleCall};
    pub use crate::reader::StorageReader;
    pub use rexec_primitives::{Address, ExecutionId, Selector, Word};
}
