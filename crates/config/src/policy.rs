//! Version resolution policy

use serde::{Deserialize, Serialize};

/// How an instance picks the selector table it dispatches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VersionPolicy {
    /// Always resolve against the application's current version.
    #[default]
    Latest,
    /// Resolve against the version the instance was created with, until its
    /// admin upgrades it explicitly.
    Pinned,
}

impl std::str::FromStr for VersionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "latest" | "late" => Ok(Self::Latest),
            "pinned" | "pin" => Ok(Self::Pinned),
            other => Err(format!("unknown version policy '{other}'")),
        }
    }
}

impl std::fmt::Display for VersionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Latest => write!(f, "latest"),
            Self::Pinned => write!(f, "pinned"),
        }
    }
}
