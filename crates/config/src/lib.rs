//! rexec configuration
//!
//! Settings that bound what a single engine call may do and choose how
//! instances resolve selectors after their application publishes a new
//! version. Settings load from TOML; every field has a default.

mod error;
mod policy;
mod settings;

pub use error::{ConfigError, ConfigResult};
pub use policy::VersionPolicy;
pub use settings::EngineSettings;

/// Longest exception reason carried in a notification, in bytes.
pub const DEFAULT_MAX_REASON_LENGTH: usize = 32;
/// Storage writes one call may commit.
pub const DEFAULT_MAX_STORAGE_WRITES: usize = 256;
/// Events one call may emit.
pub const DEFAULT_MAX_EVENTS: usize = 64;
/// Payments one call may deliver.
pub const DEFAULT_MAX_PAYMENTS: usize = 16;
