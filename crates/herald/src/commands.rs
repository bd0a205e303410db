// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in command interpreter: liveness and per-tenant settings commands.
//!
//! Settings commands write through the same [`SettingsCaches`] the dispatcher
//! reads, so a change is visible to the very next event of the tenant.
//! Results are acknowledged with a reaction on the command message.

use std::str::FromStr;

use async_trait::async_trait;
use herald_core::{
    CommandInterpreter, CommandPrefix, CommandRequest, HeraldError, OperatingMode, PresenceKind,
    SettingKey,
};
use herald_dispatch::SettingsCaches;
use tracing::{debug, info};

/// Reaction acknowledging `ping`.
pub const PONG: &str = "🏓";

/// Reaction acknowledging an applied settings change.
pub const APPLIED: &str = "✅";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command<'a> {
    Ping,
    SetPrefix(&'a str),
    Mode(&'a str),
    StatusSeen(&'a str),
    ReadReceipts(&'a str),
    Presence(&'a str),
    Unknown(&'a str),
}

impl<'a> Command<'a> {
    fn parse(body: &'a str) -> Self {
        let mut words = body.split_whitespace();
        let name = words.next().unwrap_or("");
        let arg = words.next().unwrap_or("");
        match name.to_ascii_lowercase().as_str() {
            "ping" => Command::Ping,
            "setprefix" => Command::SetPrefix(arg),
            "mode" => Command::Mode(arg),
            "status" => Command::StatusSeen(arg),
            "receipts" => Command::ReadReceipts(arg),
            "presence" => Command::Presence(arg),
            _ => Command::Unknown(name),
        }
    }

    fn changes_settings(self) -> bool {
        !matches!(self, Command::Ping | Command::Unknown(_))
    }
}

fn parse_toggle(key: SettingKey, raw: &str) -> Result<bool, HeraldError> {
    match raw.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" => Ok(true),
        "off" | "false" | "no" => Ok(false),
        other => Err(HeraldError::InvalidSetting {
            key: key.to_string(),
            message: format!("expected on/off, got `{other}`"),
        }),
    }
}

fn parse_presence(raw: &str) -> Result<Option<PresenceKind>, HeraldError> {
    if raw.eq_ignore_ascii_case("off") {
        return Ok(None);
    }
    PresenceKind::from_str(&raw.to_ascii_lowercase())
        .map(Some)
        .map_err(|_| HeraldError::InvalidSetting {
            key: SettingKey::Features.to_string(),
            message: format!("unknown presence `{raw}`"),
        })
}

/// Interprets `ping`, `setprefix`, `mode`, `status`, `receipts` and `presence`.
///
/// Settings commands are accepted only from the operator or the bot's own
/// identity. `ping` answers anyone in admin-assisted mode.
#[derive(Debug, Clone)]
pub struct SettingsInterpreter {
    caches: SettingsCaches,
}

impl SettingsInterpreter {
    pub fn new(caches: SettingsCaches) -> Self {
        Self { caches }
    }

    fn authorized(command: Command<'_>, request: &CommandRequest<'_>) -> bool {
        if request.event.is_self_originated() {
            return true;
        }
        !command.changes_settings() && request.mode == OperatingMode::AdminAssisted
    }

    async fn apply(&self, command: Command<'_>, request: &CommandRequest<'_>) -> Result<(), HeraldError> {
        let tenant = &request.session.tenant_id;
        match command {
            Command::Ping | Command::Unknown(_) => Ok(()),
            Command::SetPrefix(raw) => {
                let prefix = CommandPrefix::new(raw)?;
                self.caches.prefix.set(tenant, prefix).await
            }
            Command::Mode(raw) => {
                let mode = OperatingMode::from_str(raw)?;
                self.caches.mode.set(tenant, mode).await
            }
            Command::StatusSeen(raw) => {
                let on = parse_toggle(SettingKey::Features, raw)?;
                let mut flags = self.caches.features.get(tenant).await.into_value();
                flags.status_seen = on;
                self.caches.features.set(tenant, flags).await
            }
            Command::ReadReceipts(raw) => {
                let on = parse_toggle(SettingKey::Features, raw)?;
                let mut flags = self.caches.features.get(tenant).await.into_value();
                flags.read_receipts = on;
                self.caches.features.set(tenant, flags).await
            }
            Command::Presence(raw) => {
                let presence = parse_presence(raw)?;
                let mut flags = self.caches.features.get(tenant).await.into_value();
                flags.presence = presence;
                self.caches.features.set(tenant, flags).await
            }
        }
    }
}

#[async_trait]
impl CommandInterpreter for SettingsInterpreter {
    async fn execute(&self, request: CommandRequest<'_>) -> Result<(), HeraldError> {
        let command = Command::parse(request.body());
        if let Command::Unknown(name) = command {
            debug!(tenant_id = %request.session.tenant_id, command = name, "unknown command");
            return Ok(());
        }
        if !Self::authorized(command, &request) {
            debug!(
                tenant_id = %request.session.tenant_id,
                sender = %request.event.sender,
                mode = %request.mode,
                "command not permitted for sender"
            );
            return Ok(());
        }

        self.apply(command, &request).await?;

        let reaction = if command == Command::Ping { PONG } else { APPLIED };
        if command.changes_settings() {
            info!(tenant_id = %request.session.tenant_id, body = request.body(), "tenant setting changed");
        }
        request
            .session
            .transport
            .send_reaction(&request.event.key, reaction, &[])
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use herald_core::{
        AuthId, ChatEvent, FeatureFlags, SettingValue, SubscriptionTier, TenantId, TenantSession,
    };
    use herald_dispatch::DispatchSettings;
    use herald_test_utils::{EventBuilder, MockSettingsStore, MockTransport};

    const TENANT: &str = "551199999";

    struct Fixture {
        interpreter: SettingsInterpreter,
        caches: SettingsCaches,
        store: Arc<MockSettingsStore>,
        transport: Arc<MockTransport>,
        session: TenantSession,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MockSettingsStore::new());
        let caches = SettingsCaches::new(store.clone(), &DispatchSettings::default());
        let transport = Arc::new(MockTransport::new());
        let session = TenantSession::new(
            TenantId::new(TENANT),
            AuthId::new("auth-1"),
            transport.clone(),
        );
        Fixture {
            interpreter: SettingsInterpreter::new(caches.clone()),
            caches,
            store,
            transport,
            session,
        }
    }

    fn operator_event(text: &str) -> ChatEvent {
        let raw = EventBuilder::new("C1").direct("5511").from_me().text(text).build();
        herald_router::normalize(raw, None, chrono::Utc::now()).unwrap()
    }

    fn peer_event(text: &str) -> ChatEvent {
        let raw = EventBuilder::new("C2").direct("5511").text(text).build();
        herald_router::normalize(raw, None, chrono::Utc::now()).unwrap()
    }

    async fn run(
        fx: &Fixture,
        event: &ChatEvent,
        mode: OperatingMode,
    ) -> Result<(), HeraldError> {
        let prefix = CommandPrefix::default();
        let tier = SubscriptionTier::default();
        fx.interpreter
            .execute(CommandRequest {
                session: &fx.session,
                event,
                text: event.text(),
                tier: &tier,
                prefix: &prefix,
                mode,
            })
            .await
    }

    #[test]
    fn parse_recognizes_commands_case_insensitively() {
        assert_eq!(Command::parse("PING"), Command::Ping);
        assert_eq!(Command::parse("setprefix !"), Command::SetPrefix("!"));
        assert_eq!(Command::parse("mode   admin"), Command::Mode("admin"));
        assert_eq!(Command::parse("status on"), Command::StatusSeen("on"));
        assert_eq!(Command::parse("hello there"), Command::Unknown("hello"));
        assert_eq!(Command::parse(""), Command::Unknown(""));
    }

    #[tokio::test]
    async fn ping_reacts_with_pong() {
        let fx = fixture();
        run(&fx, &operator_event(".ping"), OperatingMode::SelfOnly).await.unwrap();
        let reactions = fx.transport.reactions().await;
        assert_eq!(reactions.len(), 1);
        assert_eq!(reactions[0].emoji, PONG);
        assert_eq!(reactions[0].key.id, "C1");
    }

    #[tokio::test]
    async fn peer_ping_depends_on_mode() {
        let fx = fixture();
        run(&fx, &peer_event(".ping"), OperatingMode::SelfOnly).await.unwrap();
        assert!(fx.transport.reactions().await.is_empty());

        run(&fx, &peer_event(".ping"), OperatingMode::AdminAssisted).await.unwrap();
        assert_eq!(fx.transport.reactions().await.len(), 1);
    }

    #[tokio::test]
    async fn setprefix_writes_through_cache() {
        let fx = fixture();
        let tenant = TenantId::new(TENANT);
        run(&fx, &operator_event(".setprefix !"), OperatingMode::SelfOnly).await.unwrap();

        assert_eq!(fx.store.value(TENANT, SettingKey::Prefix).as_deref(), Some("!"));
        assert_eq!(fx.caches.prefix.get(&tenant).await.value().as_str(), "!");
        assert_eq!(fx.transport.reactions().await[0].emoji, APPLIED);
    }

    #[tokio::test]
    async fn peers_cannot_change_settings() {
        let fx = fixture();
        run(&fx, &peer_event(".mode admin"), OperatingMode::AdminAssisted).await.unwrap();
        assert_eq!(fx.store.upsert_calls(), 0);
        assert!(fx.transport.reactions().await.is_empty());
    }

    #[tokio::test]
    async fn mode_command_stores_kebab_case() {
        let fx = fixture();
        run(&fx, &operator_event(".mode admin"), OperatingMode::SelfOnly).await.unwrap();
        assert_eq!(
            fx.store.value(TENANT, SettingKey::Mode).as_deref(),
            Some("admin-assisted")
        );
    }

    #[tokio::test]
    async fn feature_commands_merge_into_existing_flags() {
        let fx = fixture();
        run(&fx, &operator_event(".status on"), OperatingMode::SelfOnly).await.unwrap();
        run(&fx, &operator_event(".presence composing"), OperatingMode::SelfOnly).await.unwrap();

        let raw = fx.store.value(TENANT, SettingKey::Features).unwrap();
        let flags = FeatureFlags::decode(&raw).unwrap();
        assert!(flags.status_seen);
        assert!(!flags.read_receipts);
        assert_eq!(flags.presence, Some(PresenceKind::Composing));

        run(&fx, &operator_event(".presence off"), OperatingMode::SelfOnly).await.unwrap();
        let raw = fx.store.value(TENANT, SettingKey::Features).unwrap();
        assert_eq!(FeatureFlags::decode(&raw).unwrap().presence, None);
    }

    #[tokio::test]
    async fn invalid_arguments_fail_without_writing() {
        let fx = fixture();
        for text in [".status maybe", ".presence dancing", ".mode everyone", ".setprefix"] {
            let err = run(&fx, &operator_event(text), OperatingMode::SelfOnly)
                .await
                .unwrap_err();
            assert!(matches!(err, HeraldError::InvalidSetting { .. }), "{text}: {err}");
        }
        assert_eq!(fx.store.upsert_calls(), 0);
        assert!(fx.transport.reactions().await.is_empty());
    }

    #[tokio::test]
    async fn unknown_command_is_ignored() {
        let fx = fixture();
        run(&fx, &operator_event(".dance"), OperatingMode::SelfOnly).await.unwrap();
        assert!(fx.transport.reactions().await.is_empty());
    }

    #[tokio::test]
    async fn store_failure_surfaces_as_error() {
        let fx = fixture();
        fx.store.set_failing(true);
        let err = run(&fx, &operator_event(".setprefix #"), OperatingMode::SelfOnly)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "transient_store");
    }
}
