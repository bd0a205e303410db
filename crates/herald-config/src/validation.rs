// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as non-empty paths, positive TTLs, and unique tenant identifiers.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::HeraldConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &HeraldConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    let dispatch = &config.dispatch;
    if dispatch.default_prefix.trim().is_empty() {
        fail("dispatch.default_prefix must not be empty".to_string());
    }

    for (name, secs) in [
        ("mode_ttl_secs", dispatch.mode_ttl_secs),
        ("prefix_ttl_secs", dispatch.prefix_ttl_secs),
        ("features_ttl_secs", dispatch.features_ttl_secs),
    ] {
        if secs == 0 {
            fail(format!("dispatch.{name} must be greater than 0"));
        }
    }

    if dispatch.chat_log_capacity == 0 {
        fail("dispatch.chat_log_capacity must be greater than 0".to_string());
    }

    if dispatch.status_batch_delay_ms == 0 {
        fail("dispatch.status_batch_delay_ms must be greater than 0".to_string());
    }

    if dispatch.broadcast_chat_id.trim().is_empty() {
        fail("dispatch.broadcast_chat_id must not be empty".to_string());
    }

    let mut seen = HashSet::new();
    for (i, tenant) in config.tenants.iter().enumerate() {
        if tenant.tenant_id.trim().is_empty() {
            fail(format!("tenants[{i}].tenant_id must not be empty"));
        } else if !seen.insert(tenant.tenant_id.as_str()) {
            fail(format!(
                "duplicate tenant id `{}` in [[tenants]] array",
                tenant.tenant_id
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
