// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-tenant settings and their durable-store encoding.
//!
//! The store holds opaque `(tenant, key) -> string` rows. Each cached setting
//! type implements [`SettingValue`], which names its key and converts to and
//! from the stored string.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::HeraldError;

/// Key of a row in the tenant settings table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SettingKey {
    Prefix,
    Mode,
    Features,
}

/// A tenant setting that can live in the durable store and in a config cache.
pub trait SettingValue: Clone + Send + Sync + 'static {
    const KEY: SettingKey;

    fn encode(&self) -> String;

    fn decode(raw: &str) -> Result<Self, HeraldError>;
}

/// Leading text that turns a plain message into a command.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandPrefix(String);

impl CommandPrefix {
    /// Builds a prefix, rejecting empty or whitespace-only input.
    pub fn new(prefix: impl Into<String>) -> Result<Self, HeraldError> {
        let prefix = prefix.into();
        if prefix.trim().is_empty() {
            return Err(HeraldError::InvalidSetting {
                key: SettingKey::Prefix.to_string(),
                message: "prefix must not be empty".to_string(),
            });
        }
        Ok(Self(prefix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn matches(&self, text: &str) -> bool {
        text.starts_with(self.0.as_str())
    }
}

impl Default for CommandPrefix {
    fn default() -> Self {
        Self(".".to_string())
    }
}

impl fmt::Display for CommandPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl SettingValue for CommandPrefix {
    const KEY: SettingKey = SettingKey::Prefix;

    fn encode(&self) -> String {
        self.0.clone()
    }

    fn decode(raw: &str) -> Result<Self, HeraldError> {
        Self::new(raw)
    }
}

/// Who the bot acts for in shared chats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum OperatingMode {
    /// Only the operator can drive the bot.
    #[default]
    SelfOnly,
    /// Chat admins can drive the bot too.
    AdminAssisted,
}

impl std::str::FromStr for OperatingMode {
    type Err = HeraldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "self-only" | "self" | "me" => Ok(OperatingMode::SelfOnly),
            "admin-assisted" | "admin" => Ok(OperatingMode::AdminAssisted),
            other => Err(HeraldError::InvalidSetting {
                key: SettingKey::Mode.to_string(),
                message: format!("unknown mode `{other}`"),
            }),
        }
    }
}

impl SettingValue for OperatingMode {
    const KEY: SettingKey = SettingKey::Mode;

    fn encode(&self) -> String {
        self.to_string()
    }

    fn decode(raw: &str) -> Result<Self, HeraldError> {
        raw.parse()
    }
}

/// Presence state the transport can advertise in a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PresenceKind {
    Available,
    Unavailable,
    Composing,
    Recording,
    Paused,
}

/// Standing per-tenant toggles consulted on every event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    /// View and react to status broadcasts.
    pub status_seen: bool,
    /// Send read receipts for peer messages.
    pub read_receipts: bool,
    /// Presence to advertise in every chat that receives an event.
    pub presence: Option<PresenceKind>,
}

impl SettingValue for FeatureFlags {
    const KEY: SettingKey = SettingKey::Features;

    fn encode(&self) -> String {
        // Plain struct of bools and a unit enum; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    fn decode(raw: &str) -> Result<Self, HeraldError> {
        serde_json::from_str(raw).map_err(|e| HeraldError::InvalidSetting {
            key: SettingKey::Features.to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_accepts_legacy_store_values() {
        assert_eq!(OperatingMode::decode("me").unwrap(), OperatingMode::SelfOnly);
        assert_eq!(
            OperatingMode::decode("admin").unwrap(),
            OperatingMode::AdminAssisted
        );
        assert_eq!(
            OperatingMode::decode("admin-assisted").unwrap(),
            OperatingMode::AdminAssisted
        );
        assert!(OperatingMode::decode("all").is_err());
    }

    #[test]
    fn mode_encodes_kebab_case() {
        assert_eq!(OperatingMode::SelfOnly.encode(), "self-only");
        assert_eq!(OperatingMode::AdminAssisted.encode(), "admin-assisted");
        assert_eq!(OperatingMode::default(), OperatingMode::SelfOnly);
    }

    #[test]
    fn empty_prefix_rejected() {
        assert!(CommandPrefix::new("").is_err());
        assert!(CommandPrefix::new("  ").is_err());
        let prefix = CommandPrefix::new("!").unwrap();
        assert!(prefix.matches("!ping"));
        assert!(!prefix.matches("ping!"));
        assert_eq!(CommandPrefix::default().as_str(), ".");
    }

    #[test]
    fn feature_flags_tolerate_missing_fields() {
        let flags = FeatureFlags::decode(r#"{"status_seen":true}"#).unwrap();
        assert!(flags.status_seen);
        assert!(!flags.read_receipts);
        assert_eq!(flags.presence, None);

        let encoded = FeatureFlags {
            presence: Some(PresenceKind::Composing),
            ..FeatureFlags::default()
        }
        .encode();
        assert!(encoded.contains("composing"));
        assert!(FeatureFlags::decode("not json").is_err());
    }

    #[test]
    fn setting_keys_render_snake_case() {
        assert_eq!(SettingKey::Prefix.to_string(), "prefix");
        assert_eq!(SettingKey::Features.to_string(), "features");
    }
}
