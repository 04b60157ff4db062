//! # rexec: application registry and delegated-execution storage engine
//!
//! Applications are registered as tables of function selectors bound to
//! logic modules. Each instance of an application owns an isolated storage
//! partition keyed by its execution id. Modules never write storage
//! themselves: they read through a [`StorageReader`](engine::StorageReader) and
//! return an effect set that the engine validates and commits atomically.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rexec::prelude::*;
//!
//! fn main() -> rexec::Result<()> {
//!     let mut engine = rexec::engine_from_config("rexec.toml")?;
//!     let provider = Address::from_low_u64(1);
//!     let registry = engine.open_registry(provider)?;
//!     # let _ = registry;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`primitives`]: words, addresses, selectors and execution ids
//! - [`store`]: the partitioned key-value store and its write batches
//! - [`config`]: engine settings loaded from TOML
//! - [`engine`]: registry, dispatch, commit and notifications
//! - `apps` (feature `apps`): the DutchCrowdsale sample application

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

use std::path::Path;

pub use rexec_config as config;
pub use rexec_engine as engine;
pub use rexec_primitives as primitives;
pub use rexec_store as store;

#[cfg(feature = "apps")]
pub use rexec_apps as apps;

use config::EngineSettings;
use engine::ExecutionEngine;
use store::MemoryStore;

/// Common imports for building and driving applications
pub mod prelude {
    pub use crate::config::{EngineSettings, VersionPolicy};
    pub use crate::engine::prelude::*;
    pub use crate::engine::{
        EngineError, ExecCounts, ExecutionEngine, Notification, ReservationBook,
    };
    pub use crate::store::{MemoryStore, ReadStore, Store};

    #[cfg(feature = "apps")]
    pub use crate::apps::{DutchCrowdsale, Function, APP_NAME};
}

/// Result type for facade operations
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// In-memory engine configured from the TOML file at `path`.
pub fn engine_from_config(path: impl AsRef<Path>) -> Result<ExecutionEngine<MemoryStore>> {
    let settings = EngineSettings::load(path)?;
    Ok(ExecutionEngine::new(MemoryStore::new(), settings))
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
