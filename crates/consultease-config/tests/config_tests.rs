// SPDX-FileCopyrightText: 2026 ConsultEase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the ConsultEase configuration system.

use consultease_config::diagnostic::suggest_key;
use consultease_config::loader::load_config_from_path;
use consultease_config::{load_and_validate_str, load_config_from_str};
use serial_test::serial;

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_config() {
    let toml = r#"
[system]
name = "consultease-lab"
log_level = "debug"

[broker]
host = "broker.campus.local"
port = 8883
client_id = "central-1"
keep_alive_secs = 15
publish_timeout_ms = 500
reconnect_delay_secs = 2

[storage]
database_path = "/tmp/consultease-test.db"
wal_mode = false

[queue]
max_attempts = 3
sweep_interval_secs = 30
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.system.name, "consultease-lab");
    assert_eq!(config.system.log_level, "debug");
    assert_eq!(config.broker.host, "broker.campus.local");
    assert_eq!(config.broker.port, 8883);
    assert_eq!(config.broker.client_id, "central-1");
    assert_eq!(config.broker.keep_alive_secs, 15);
    assert_eq!(config.broker.publish_timeout_ms, 500);
    assert_eq!(config.storage.database_path, "/tmp/consultease-test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.queue.max_attempts, 3);
    assert_eq!(config.queue.sweep_interval_secs, 30);
}

/// Missing optional sections use defaults without error.
#[test]
fn missing_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.system.name, "consultease");
    assert_eq!(config.system.log_level, "info");
    assert_eq!(config.broker.host, "localhost");
    assert_eq!(config.broker.port, 1883);
    assert_eq!(config.broker.client_id, "consultease-central");
    assert!(config.storage.wal_mode);
    assert_eq!(config.queue.max_attempts, 5);
    assert_eq!(config.queue.sweep_interval_secs, 60);
}

/// Unknown field in a section is rejected by deny_unknown_fields.
#[test]
fn unknown_field_in_broker_produces_error() {
    let toml = r#"
[broker]
hots = "localhost"
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("hots"),
        "error should mention unknown field or the bad key, got: {err_str}"
    );
}

/// load_and_validate_str surfaces semantic validation failures.
#[test]
fn validation_rejects_zero_max_attempts() {
    let toml = r#"
[queue]
max_attempts = 0
"#;

    let errors = load_and_validate_str(toml).expect_err("should fail validation");
    assert!(errors
        .iter()
        .any(|e| e.to_string().contains("queue.max_attempts")));
}

/// Typo suggestions surface the intended key.
#[test]
fn typo_suggestion_for_broker_keys() {
    let valid = &[
        "host",
        "port",
        "client_id",
        "keep_alive_secs",
        "publish_timeout_ms",
        "reconnect_delay_secs",
    ];
    assert_eq!(suggest_key("client_di", valid), Some("client_id".to_string()));
    assert_eq!(
        suggest_key("keep_alive_sec", valid),
        Some("keep_alive_secs".to_string())
    );
}

/// Environment variables override file values, with underscore-containing
/// keys mapped to the right section.
#[test]
#[serial]
fn env_vars_override_file_values() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "consultease.toml",
            r#"
[broker]
host = "from-file"
client_id = "from-file"
"#,
        )?;
        jail.set_env("CONSULTEASE_BROKER_HOST", "from-env");
        jail.set_env("CONSULTEASE_BROKER_CLIENT_ID", "central-env");

        let config =
            load_config_from_path(std::path::Path::new("consultease.toml")).expect("valid config");
        assert_eq!(config.broker.host, "from-env");
        assert_eq!(config.broker.client_id, "central-env");
        Ok(())
    });
}

/// Partial sections keep defaults for unspecified keys.
#[test]
fn partial_broker_section_keeps_other_defaults() {
    let toml = r#"
[broker]
host = "10.0.0.2"
"#;

    let config = load_config_from_str(toml).unwrap();
    assert_eq!(config.broker.host, "10.0.0.2");
    assert_eq!(config.broker.port, 1883);
    assert_eq!(config.broker.client_id, "consultease-central");
}
