// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Herald dispatch core.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Herald configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HeraldConfig {
    /// Process identity and logging.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Durable settings store.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Dispatch core tuning: cache TTLs, log bound, batching and throttling.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Built-in security gate settings.
    #[serde(default)]
    pub security: SecurityConfig,

    /// Prometheus metrics settings.
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Tenants served by this process.
    #[serde(default)]
    pub tenants: Vec<TenantConfig>,
}

/// Process identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of this dispatch process.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "herald".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for better concurrent read performance.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    "herald.db".to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// Dispatch core configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchConfig {
    /// Command prefix used when a tenant has none stored.
    #[serde(default = "default_prefix")]
    pub default_prefix: String,

    /// Freshness window of cached operating modes.
    #[serde(default = "default_ttl_secs")]
    pub mode_ttl_secs: u64,

    /// Freshness window of cached command prefixes.
    #[serde(default = "default_ttl_secs")]
    pub prefix_ttl_secs: u64,

    /// Freshness window of cached feature flags.
    #[serde(default = "default_ttl_secs")]
    pub features_ttl_secs: u64,

    /// Maximum entries kept per chat in the recent message log.
    #[serde(default = "default_chat_log_capacity")]
    pub chat_log_capacity: usize,

    /// Delay between the first status event of a burst and its flush.
    #[serde(default = "default_status_batch_delay_ms")]
    pub status_batch_delay_ms: u64,

    /// Minimum gap between two presence updates in the same chat.
    #[serde(default = "default_presence_cooldown_ms")]
    pub presence_cooldown_ms: u64,

    /// Emoji reacted to viewed status broadcasts.
    #[serde(default = "default_status_reaction")]
    pub status_reaction: String,

    /// Reserved chat identifier on which status broadcasts arrive.
    #[serde(default = "default_broadcast_chat_id")]
    pub broadcast_chat_id: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            default_prefix: default_prefix(),
            mode_ttl_secs: default_ttl_secs(),
            prefix_ttl_secs: default_ttl_secs(),
            features_ttl_secs: default_ttl_secs(),
            chat_log_capacity: default_chat_log_capacity(),
            status_batch_delay_ms: default_status_batch_delay_ms(),
            presence_cooldown_ms: default_presence_cooldown_ms(),
            status_reaction: default_status_reaction(),
            broadcast_chat_id: default_broadcast_chat_id(),
        }
    }
}

impl DispatchConfig {
    pub fn mode_ttl(&self) -> Duration {
        Duration::from_secs(self.mode_ttl_secs)
    }

    pub fn prefix_ttl(&self) -> Duration {
        Duration::from_secs(self.prefix_ttl_secs)
    }

    pub fn features_ttl(&self) -> Duration {
        Duration::from_secs(self.features_ttl_secs)
    }

    pub fn status_batch_delay(&self) -> Duration {
        Duration::from_millis(self.status_batch_delay_ms)
    }

    pub fn presence_cooldown(&self) -> Duration {
        Duration::from_millis(self.presence_cooldown_ms)
    }
}

fn default_prefix() -> String {
    ".".to_string()
}

fn default_ttl_secs() -> u64 {
    600
}

fn default_chat_log_capacity() -> usize {
    1000
}

fn default_status_batch_delay_ms() -> u64 {
    1000
}

fn default_presence_cooldown_ms() -> u64 {
    5000
}

fn default_status_reaction() -> String {
    "❤️".to_string()
}

fn default_broadcast_chat_id() -> String {
    "status@broadcast".to_string()
}

/// Built-in security gate configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SecurityConfig {
    /// Bare sender identifiers whose events are blocked.
    #[serde(default)]
    pub blocked_senders: Vec<String>,
}

/// Prometheus metrics configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Install the Prometheus recorder at startup.
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
        }
    }
}

fn default_metrics_enabled() -> bool {
    true
}

/// One tenant served by `herald serve`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TenantConfig {
    /// Stable tenant identifier (the operator's bare chat id).
    pub tenant_id: String,

    /// Billing/owner identity behind the tenant.
    pub auth_id: String,
}
