//! Error types for configuration loading.

use thiserror::Error;

/// Errors raised while loading or validating settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Settings file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Path that failed.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// TOML could not be parsed into settings.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of its allowed range.
    #[error("Invalid setting {field}: {message}")]
    Invalid {
        /// Offending field.
        field: &'static str,
        /// Error message.
        message: String,
    },
}

impl ConfigError {
    /// Create an invalid setting error.
    pub fn invalid<S: Into<String>>(field: &'static str, message: S) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
