//! Engine settings

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::policy::VersionPolicy;
use crate::{
    DEFAULT_MAX_EVENTS, DEFAULT_MAX_PAYMENTS, DEFAULT_MAX_REASON_LENGTH,
    DEFAULT_MAX_STORAGE_WRITES,
};

/// Limits and policies applied by the execution engine.
///
/// ```toml
/// max_reason_length = 32
/// max_storage_writes = 256
/// max_events = 64
/// max_payments = 16
/// version_policy = "latest"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Exception reasons are truncated to this many bytes
    #[serde(default = "default_max_reason_length")]
    pub max_reason_length: usize,

    /// Upper bound on storage writes committed by one call
    #[serde(default = "default_max_storage_writes")]
    pub max_storage_writes: usize,

    /// Upper bound on module events emitted by one call
    #[serde(default = "default_max_events")]
    pub max_events: usize,

    /// Upper bound on payments delivered by one call
    #[serde(default = "default_max_payments")]
    pub max_payments: usize,

    /// Selector resolution policy for existing instances
    #[serde(default)]
    pub version_policy: VersionPolicy,
}

fn default_max_reason_length() -> usize {
    DEFAULT_MAX_REASON_LENGTH
}

fn default_max_storage_writes() -> usize {
    DEFAULT_MAX_STORAGE_WRITES
}

fn default_max_events() -> usize {
    DEFAULT_MAX_EVENTS
}

fn default_max_payments() -> usize {
    DEFAULT_MAX_PAYMENTS
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_reason_length: DEFAULT_MAX_REASON_LENGTH,
            max_storage_writes: DEFAULT_MAX_STORAGE_WRITES,
            max_events: DEFAULT_MAX_EVENTS,
            max_payments: DEFAULT_MAX_PAYMENTS,
            version_policy: VersionPolicy::Latest,
        }
    }
}

impl EngineSettings {
    /// Default settings with instances pinned to their creation version.
    pub fn pinned() -> Self {
        Self {
            version_policy: VersionPolicy::Pinned,
            ..Self::default()
        }
    }

    /// Parses and validates settings from TOML text.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let settings: Self = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads, parses and validates a settings file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let settings = Self::from_toml_str(&text)?;
        debug!(path = %path.display(), policy = %settings.version_policy, "loaded engine settings");
        Ok(settings)
    }

    /// Serializes the settings back to TOML.
    pub fn to_toml_string(&self) -> String {
        // Plain scalars only; serialization cannot fail.
        toml::to_string(self).unwrap_or_default()
    }

    /// Checks that every limit is usable.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_reason_length == 0 || self.max_reason_length > 256 {
            return Err(ConfigError::invalid(
                "max_reason_length",
                format!("must be within 1..=256, got {}", self.max_reason_length),
            ));
        }
        if self.max_storage_writes == 0 {
            return Err(ConfigError::invalid("max_storage_writes", "must be positive"));
        }
        if self.max_events == 0 {
            return Err(ConfigError::invalid("max_events", "must be positive"));
        }
        if self.max_payments == 0 {
            return Err(ConfigError::invalid("max_payments", "must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = EngineSettings::default();
        assert_eq!(settings.max_reason_length, 32);
        assert_eq!(settings.version_policy, VersionPolicy::Latest);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let settings = EngineSettings::from_toml_str("max_events = 8\n").unwrap();
        assert_eq!(settings.max_events, 8);
        assert_eq!(settings.max_payments, DEFAULT_MAX_PAYMENTS);
    }

    #[test]
    fn test_policy_from_toml() {
        let settings = EngineSettings::from_toml_str("version_policy = \"pinned\"\n").unwrap();
        assert_eq!(settings, EngineSettings::pinned());
    }

    #[test]
    fn test_invalid_reason_length() {
        let err = EngineSettings::from_toml_str("max_reason_length = 0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "max_reason_length",
                ..
            }
        ));
    }

    #[test]
    fn test_zero_limits_rejected() {
        for field in ["max_storage_writes", "max_events", "max_payments"] {
            let err = EngineSettings::from_toml_str(&format!("{field} = 0\n")).unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid { field: rejected, .. } if rejected == field),
                "{field} = 0 accepted"
            );
        }
    }

    #[test]
    fn test_malformed_toml() {
        let err = EngineSettings::from_toml_str("max_events = \"many\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
