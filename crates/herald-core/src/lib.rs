// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Herald chat dispatch core.
//!
//! This crate provides the domain types, error type, and collaborator traits
//! shared across the Herald workspace. Every external boundary (transport,
//! settings store, security, interpreter, handlers, metrics) is a trait here.

pub mod error;
pub mod event;
pub mod settings;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::HeraldError;
pub use event::{
    BROADCAST_CHAT_ID, ChatEvent, Direction, EventKey, GROUP_SUFFIX, InboundEvent, Payload,
    PayloadKind, ProtocolKind, bare_id,
};
pub use settings::{
    CommandPrefix, FeatureFlags, OperatingMode, PresenceKind, SettingKey, SettingValue,
};
pub use types::{AdapterType, AuthId, HealthStatus, SubscriptionTier, TenantId, TenantSession};

pub use traits::{
    CommandInterpreter, CommandRequest, EventHandler, HandlerInput, MetricsSink, PluginAdapter,
    ProcessingSample, SecurityCheck, SecurityGate, TenantSettingsStore, TierSource, Transport,
    Verdict,
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn error_kinds_are_distinct() {
        let errors = [
            HeraldError::malformed("no chat"),
            HeraldError::store(std::io::Error::other("db down")),
            HeraldError::SecurityBlocked {
                reason: "spam".into(),
            },
            HeraldError::handler("media", std::io::Error::other("boom")),
            HeraldError::transport("socket closed"),
            HeraldError::InvalidSetting {
                key: "mode".into(),
                message: "bad".into(),
            },
            HeraldError::Config("test".into()),
            HeraldError::Internal("test".into()),
        ];
        let mut kinds: Vec<_> = errors.iter().map(HeraldError::kind).collect();
        kinds.sort_unstable();
        kinds.dedup();
        assert_eq!(kinds.len(), errors.len());
    }

    #[test]
    fn error_display_includes_context() {
        let err = HeraldError::handler("delete_notice", std::io::Error::other("gone"));
        assert_eq!(err.to_string(), "handler `delete_notice` failed: gone");
        let err = HeraldError::malformed("missing remote jid");
        assert!(err.to_string().contains("missing remote jid"));
    }

    #[test]
    fn adapter_type_round_trips_through_strings() {
        for name in ["Transport", "Store", "Security", "Interpreter", "Metrics"] {
            let parsed = AdapterType::from_str(name).unwrap();
            assert_eq!(parsed.to_string(), name);
        }
    }

    #[test]
    fn default_tier_is_free() {
        assert_eq!(SubscriptionTier::default().as_str(), "free");
    }

    #[test]
    fn processing_sample_reports_millis() {
        let sample = ProcessingSample {
            processing_time: std::time::Duration::from_micros(2_500),
        };
        assert_eq!(sample.processing_time_ms(), 2);
    }
}
