// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runtime tunables of the dispatcher, resolved from `[dispatch]`.

use std::time::Duration;

use herald_config::DispatchConfig;
use herald_core::{BROADCAST_CHAT_ID, CommandPrefix, HeraldError};

/// Validated dispatcher settings.
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub default_prefix: CommandPrefix,
    pub mode_ttl: Duration,
    pub prefix_ttl: Duration,
    pub features_ttl: Duration,
    pub chat_log_capacity: usize,
    pub status_batch_delay: Duration,
    pub presence_cooldown: Duration,
    pub status_reaction: String,
    pub broadcast_chat_id: String,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            default_prefix: CommandPrefix::default(),
            mode_ttl: Duration::from_secs(600),
            prefix_ttl: Duration::from_secs(600),
            features_ttl: Duration::from_secs(600),
            chat_log_capacity: herald_session::DEFAULT_CHAT_LOG_CAPACITY,
            status_batch_delay: Duration::from_secs(1),
            presence_cooldown: Duration::from_secs(5),
            status_reaction: "❤️".to_string(),
            broadcast_chat_id: BROADCAST_CHAT_ID.to_string(),
        }
    }
}

impl TryFrom<&DispatchConfig> for DispatchSettings {
    type Error = HeraldError;

    fn try_from(config: &DispatchConfig) -> Result<Self, Self::Error> {
        Ok(Self {
            default_prefix: CommandPrefix::new(config.default_prefix.clone())?,
            mode_ttl: config.mode_ttl(),
            prefix_ttl: config.prefix_ttl(),
            features_ttl: config.features_ttl(),
            chat_log_capacity: config.chat_log_capacity,
            status_batch_delay: config.status_batch_delay(),
            presence_cooldown: config.presence_cooldown(),
            status_reaction: config.status_reaction.clone(),
            broadcast_chat_id: config.broadcast_chat_id.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_config_defaults() {
        let from_config = DispatchSettings::try_from(&DispatchConfig::default()).unwrap();
        let defaults = DispatchSettings::default();
        assert_eq!(from_config.default_prefix, defaults.default_prefix);
        assert_eq!(from_config.mode_ttl, Duration::from_secs(600));
        assert_eq!(from_config.chat_log_capacity, 1000);
        assert_eq!(from_config.status_batch_delay, defaults.status_batch_delay);
        assert_eq!(from_config.broadcast_chat_id, "status@broadcast");
    }

    #[test]
    fn blank_prefix_rejected() {
        let config = DispatchConfig {
            default_prefix: " ".into(),
            ..DispatchConfig::default()
        };
        assert!(DispatchSettings::try_from(&config).is_err());
    }
}
