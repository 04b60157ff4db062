//! Settings file loading.

use std::io::Write;

use rexec_config::{ConfigError, EngineSettings, VersionPolicy};

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "max_storage_writes = 12").unwrap();
    writeln!(file, "version_policy = \"pinned\"").unwrap();

    let settings = EngineSettings::load(file.path()).unwrap();
    assert_eq!(settings.max_storage_writes, 12);
    assert_eq!(settings.version_policy, VersionPolicy::Pinned);
    assert_eq!(settings.max_reason_length, 32);
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = EngineSettings::load(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn test_toml_round_trip() {
    let settings = EngineSettings {
        max_payments: 3,
        ..EngineSettings::pinned()
    };
    let text = settings.to_toml_string();
    assert_eq!(EngineSettings::from_toml_str(&text).unwrap(), settings);
}
