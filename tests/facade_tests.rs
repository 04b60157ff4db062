//! Facade wiring: configuration file to running application.

use std::io::Write;

use rexec::apps::crowdsale::{getters, SaleConfig};
use rexec::prelude::*;

fn settings_file(text: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file
}

#[test]
fn test_engine_from_config_applies_settings() {
    let file = settings_file("max_reason_length = 8\nversion_policy = \"pinned\"\n");
    let engine = rexec::engine_from_config(file.path()).unwrap();

    assert_eq!(engine.settings().max_reason_length, 8);
    assert_eq!(engine.settings().version_policy, VersionPolicy::Pinned);
    assert_eq!(engine.settings().max_events, EngineSettings::default().max_events);
}

#[test]
fn test_engine_from_config_rejects_invalid_settings() {
    let file = settings_file("max_reason_length = 0\n");
    assert!(rexec::engine_from_config(file.path()).is_err());
    assert!(rexec::engine_from_config("/nonexistent/rexec.toml").is_err());
}

#[test]
fn test_bundled_application_runs_through_the_facade() {
    let file = settings_file("");
    let mut engine = rexec::engine_from_config(file.path()).unwrap();
    let provider = Address::from_low_u64(1);
    let admin = Address::from_low_u64(2);

    let registry = engine.open_registry(provider).unwrap();
    DutchCrowdsale::new()
        .register(&mut engine, provider, registry)
        .unwrap();

    let config = SaleConfig {
        team_wallet: Address::from_low_u64(3),
        total_supply: 1_000,
        sale_cap: 500,
        start_rate: 10,
        end_rate: 5,
        duration: 60,
        start_time: u64::from(u32::MAX) * 4,
    };
    let instance = engine
        .create_instance(admin, APP_NAME, admin, registry, &config.calldata())
        .unwrap();

    let calldata = CalldataBuilder::signature(Function::InitCrowdsaleToken.signature())
        .string("Facade")
        .string("FCD")
        .uint(0)
        .build();
    let counts = engine.exec(admin, instance, &calldata).unwrap();
    assert_eq!(counts.events, 1);

    let reader = engine.reader(instance).unwrap();
    assert_eq!(getters::token_info(&reader).unwrap().symbol, "FCD");
}
