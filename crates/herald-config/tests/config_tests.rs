// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Herald configuration system.

use figment::Jail;
use herald_config::diagnostic::ConfigError;
use herald_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};

#[test]
fn valid_toml_deserializes_into_herald_config() {
    let toml = r#"
[agent]
name = "herald-test"
log_level = "debug"

[storage]
database_path = "/tmp/herald-test.db"
wal_mode = false

[dispatch]
default_prefix = "!"
mode_ttl_secs = 30
chat_log_capacity = 50
status_batch_delay_ms = 250
status_reaction = "👍"

[security]
blocked_senders = ["5511000"]

[metrics]
enabled = false

[[tenants]]
tenant_id = "551199999"
auth_id = "owner-1"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.agent.name, "herald-test");
    assert_eq!(config.agent.log_level, "debug");
    assert_eq!(config.storage.database_path, "/tmp/herald-test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.dispatch.default_prefix, "!");
    assert_eq!(config.dispatch.mode_ttl_secs, 30);
    assert_eq!(config.dispatch.prefix_ttl_secs, 600);
    assert_eq!(config.dispatch.chat_log_capacity, 50);
    assert_eq!(config.dispatch.status_batch_delay_ms, 250);
    assert_eq!(config.dispatch.status_reaction, "👍");
    assert_eq!(config.security.blocked_senders, vec!["5511000"]);
    assert!(!config.metrics.enabled);
    assert_eq!(config.tenants.len(), 1);
    assert_eq!(config.tenants[0].tenant_id, "551199999");
}

#[test]
fn missing_optional_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");
    assert_eq!(config.agent.name, "herald");
    assert_eq!(config.agent.log_level, "info");
    assert_eq!(config.storage.database_path, "herald.db");
    assert!(config.storage.wal_mode);
    assert_eq!(config.dispatch.default_prefix, ".");
    assert_eq!(config.dispatch.presence_cooldown_ms, 5000);
    assert!(config.security.blocked_senders.is_empty());
    assert!(config.metrics.enabled);
    assert!(config.tenants.is_empty());
}

#[test]
fn unknown_key_gets_suggestion() {
    let toml = r#"
[dispatch]
mode_tll_secs = 5
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown field");
    let suggestion = errors.iter().find_map(|e| match e {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } if key == "mode_tll_secs" => suggestion.clone(),
        _ => None,
    });
    assert_eq!(suggestion.as_deref(), Some("mode_ttl_secs"));
}

#[test]
fn invalid_type_is_reported_with_path() {
    let toml = r#"
[dispatch]
chat_log_capacity = "lots"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject wrong type");
    assert!(errors.iter().any(
        |e| matches!(e, ConfigError::InvalidType { key, .. } if key.contains("chat_log_capacity"))
    ));
}

#[test]
fn validation_runs_after_successful_parse() {
    let toml = r#"
[dispatch]
features_ttl_secs = 0
"#;

    let errors = load_and_validate_str(toml).expect_err("zero TTL is invalid");
    assert!(errors.iter().any(
        |e| matches!(e, ConfigError::Validation { message } if message.contains("features_ttl_secs"))
    ));
}

#[test]
fn env_vars_override_file_values() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "custom.toml",
            r#"
[dispatch]
default_prefix = "!"
mode_ttl_secs = 30
"#,
        )?;
        jail.set_env("HERALD_DISPATCH_MODE_TTL_SECS", "45");
        jail.set_env("HERALD_STORAGE_DATABASE_PATH", "/var/lib/herald/env.db");

        let config = load_and_validate_path(&jail.directory().join("custom.toml"))
            .map_err(|errors| format!("{errors:?}"))?;
        assert_eq!(config.dispatch.default_prefix, "!");
        assert_eq!(config.dispatch.mode_ttl_secs, 45);
        assert_eq!(config.storage.database_path, "/var/lib/herald/env.db");
        Ok(())
    });
}

#[test]
fn missing_config_file_falls_back_to_defaults() {
    Jail::expect_with(|jail| {
        let config = load_and_validate_path(&jail.directory().join("absent.toml"))
            .map_err(|errors| format!("{errors:?}"))?;
        assert_eq!(config.agent.name, "herald");
        Ok(())
    });
}
