// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fluent builder for raw inbound events.

use herald_core::{BROADCAST_CHAT_ID, EventKey, GROUP_SUFFIX, InboundEvent, Payload, ProtocolKind};

/// Suffix of direct-chat and user identifiers.
pub const USER_SUFFIX: &str = "@s.whatsapp.net";

/// Builds [`InboundEvent`]s addressed the way the transport addresses them.
#[derive(Debug, Clone)]
pub struct EventBuilder {
    key: EventKey,
    push_name: Option<String>,
    payload: Option<Payload>,
}

impl EventBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            key: EventKey {
                remote_jid: None,
                id: id.into(),
                participant: None,
                from_me: false,
            },
            push_name: None,
            payload: None,
        }
    }

    /// Direct chat with `peer` (bare number).
    pub fn direct(mut self, peer: &str) -> Self {
        self.key.remote_jid = Some(format!("{peer}{USER_SUFFIX}"));
        self.key.participant = None;
        self
    }

    /// Group chat `group` (bare id), sent by `participant` (bare number).
    pub fn group(mut self, group: &str, participant: &str) -> Self {
        self.key.remote_jid = Some(format!("{group}{GROUP_SUFFIX}"));
        self.key.participant = Some(format!("{participant}{USER_SUFFIX}"));
        self
    }

    /// Status broadcast posted by `poster` (bare number).
    pub fn status(mut self, poster: &str) -> Self {
        self.key.remote_jid = Some(BROADCAST_CHAT_ID.to_string());
        self.key.participant = Some(format!("{poster}{USER_SUFFIX}"));
        if self.payload.is_none() {
            self.payload = Some(Payload::StatusBroadcast { text: None });
        }
        self
    }

    pub fn remote_jid(mut self, jid: Option<&str>) -> Self {
        self.key.remote_jid = jid.map(String::from);
        self
    }

    pub fn from_me(mut self) -> Self {
        self.key.from_me = true;
        self
    }

    pub fn push_name(mut self, name: &str) -> Self {
        self.push_name = Some(name.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.payload = Some(Payload::Text {
            text: text.to_string(),
        });
        self
    }

    pub fn reply(mut self, text: &str, quoted: &str) -> Self {
        self.payload = Some(Payload::ExtendedText {
            text: text.to_string(),
            quoted_text: Some(quoted.to_string()),
        });
        self
    }

    pub fn image(mut self) -> Self {
        self.payload = Some(Payload::Image { caption: None });
        self
    }

    pub fn revoke(mut self, target_id: &str) -> Self {
        self.payload = Some(Payload::Protocol {
            kind: ProtocolKind::Revoke,
            target_id: Some(target_id.to_string()),
        });
        self
    }

    pub fn payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn build(self) -> InboundEvent {
        InboundEvent {
            key: self.key,
            push_name: self.push_name,
            payload: self.payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_event_addresses_participant() {
        let event = EventBuilder::new("G1").group("120363", "5511").text("hi").build();
        assert_eq!(event.key.remote_jid.as_deref(), Some("120363@g.us"));
        assert_eq!(event.key.participant.as_deref(), Some("5511@s.whatsapp.net"));
    }

    #[test]
    fn status_defaults_to_broadcast_payload() {
        let event = EventBuilder::new("S1").status("5511").build();
        assert_eq!(event.key.remote_jid.as_deref(), Some(BROADCAST_CHAT_ID));
        assert!(matches!(event.payload, Some(Payload::StatusBroadcast { .. })));
    }
}
