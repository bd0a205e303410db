// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound event shapes: the raw transport envelope and its normalized form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::types::TenantId;

/// Reserved chat identifier on which status broadcasts arrive.
pub const BROADCAST_CHAT_ID: &str = "status@broadcast";

/// Chat identifier suffix marking a group conversation.
pub const GROUP_SUFFIX: &str = "@g.us";

/// Transport-level addressing of an event, as delivered.
///
/// Also the handle passed back to the transport for reactions and read receipts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventKey {
    #[serde(default)]
    pub remote_jid: Option<String>,
    pub id: String,
    #[serde(default)]
    pub participant: Option<String>,
    #[serde(default)]
    pub from_me: bool,
}

/// A raw inbound event exactly as the transport hands it over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundEvent {
    pub key: EventKey,
    #[serde(default)]
    pub push_name: Option<String>,
    #[serde(default)]
    pub payload: Option<Payload>,
}

/// Subtype of a protocol message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProtocolKind {
    /// The sender deleted ("revoked") an earlier message.
    Revoke,
    EphemeralSetting,
    HistorySync,
    Other,
}

/// Message body. The set of variants is closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Payload {
    Text {
        text: String,
    },
    ExtendedText {
        text: String,
        /// Plain text of the quoted message, when this is a reply.
        #[serde(default)]
        quoted_text: Option<String>,
    },
    Image {
        #[serde(default)]
        caption: Option<String>,
    },
    Video {
        #[serde(default)]
        caption: Option<String>,
    },
    Document {
        #[serde(default)]
        file_name: Option<String>,
    },
    Audio,
    VoiceNote,
    Protocol {
        kind: ProtocolKind,
        /// Identifier of the message the protocol action applies to.
        #[serde(default)]
        target_id: Option<String>,
    },
    StatusBroadcast {
        #[serde(default)]
        text: Option<String>,
    },
}

/// Discriminant of [`Payload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PayloadKind {
    Text,
    ExtendedText,
    Image,
    Video,
    Document,
    Audio,
    VoiceNote,
    Protocol,
    StatusBroadcast,
}

impl PayloadKind {
    /// Every payload kind, in declaration order.
    pub const ALL: [PayloadKind; 9] = [
        PayloadKind::Text,
        PayloadKind::ExtendedText,
        PayloadKind::Image,
        PayloadKind::Video,
        PayloadKind::Document,
        PayloadKind::Audio,
        PayloadKind::VoiceNote,
        PayloadKind::Protocol,
        PayloadKind::StatusBroadcast,
    ];

    pub fn is_media(self) -> bool {
        matches!(
            self,
            PayloadKind::Image
                | PayloadKind::Video
                | PayloadKind::Document
                | PayloadKind::Audio
                | PayloadKind::VoiceNote
        )
    }

    pub fn is_text(self) -> bool {
        matches!(self, PayloadKind::Text | PayloadKind::ExtendedText)
    }
}

impl Payload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            Payload::Text { .. } => PayloadKind::Text,
            Payload::ExtendedText { .. } => PayloadKind::ExtendedText,
            Payload::Image { .. } => PayloadKind::Image,
            Payload::Video { .. } => PayloadKind::Video,
            Payload::Document { .. } => PayloadKind::Document,
            Payload::Audio => PayloadKind::Audio,
            Payload::VoiceNote => PayloadKind::VoiceNote,
            Payload::Protocol { .. } => PayloadKind::Protocol,
            Payload::StatusBroadcast { .. } => PayloadKind::StatusBroadcast,
        }
    }

    /// Text body of text-bearing payloads; `None` for everything else.
    pub fn text(&self) -> Option<&str> {
        match self {
            Payload::Text { text } | Payload::ExtendedText { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// Who produced an event relative to the tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Direction {
    FromOperator,
    FromPeer,
}

/// A normalized inbound event, consumed exactly once by the dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatEvent {
    pub id: String,
    pub chat_id: String,
    /// Sender with transport decorations (`@domain`, `:device`) stripped.
    pub sender: String,
    pub direction: Direction,
    /// Sender matches the tenant's own bot identity on the transport.
    pub from_bot_identity: bool,
    pub push_name: Option<String>,
    pub payload: Option<Payload>,
    pub key: EventKey,
    pub received_at: DateTime<Utc>,
}

impl ChatEvent {
    pub fn is_group(&self) -> bool {
        self.chat_id.ends_with(GROUP_SUFFIX)
    }

    pub fn is_from_operator(&self) -> bool {
        self.direction == Direction::FromOperator
    }

    /// Sent by the operator or by the bot's own identity.
    pub fn is_self_originated(&self) -> bool {
        self.is_from_operator() || self.from_bot_identity
    }

    pub fn kind(&self) -> Option<PayloadKind> {
        self.payload.as_ref().map(Payload::kind)
    }

    /// Text content, empty for non-text payloads.
    pub fn text(&self) -> &str {
        self.payload.as_ref().and_then(Payload::text).unwrap_or("")
    }

    /// Display name for activity stats: push name, else the bare sender.
    pub fn display_name(&self) -> &str {
        self.push_name.as_deref().unwrap_or(&self.sender)
    }

    /// The other party of a direct conversation, from the tenant's point of view.
    ///
    /// In groups this is the sender. In a direct chat it is the tenant itself
    /// when the operator wrote the message, otherwise the chat's peer.
    pub fn counterpart<'a>(&'a self, tenant: &'a TenantId) -> &'a str {
        if self.is_group() {
            &self.sender
        } else if self.is_from_operator() {
            tenant.as_str()
        } else {
            bare_id(&self.chat_id)
        }
    }
}

/// Strips the `@domain` and `:device` decorations from a transport identifier.
pub fn bare_id(raw: &str) -> &str {
    let without_domain = raw.split('@').next().unwrap_or(raw);
    without_domain.split(':').next().unwrap_or(without_domain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_id_strips_domain_and_device() {
        assert_eq!(bare_id("5511999@s.whatsapp.net"), "5511999");
        assert_eq!(bare_id("5511999:12@s.whatsapp.net"), "5511999");
        assert_eq!(bare_id("5511999"), "5511999");
        assert_eq!(bare_id(""), "");
    }

    #[test]
    fn payload_kinds_partition_media_and_text() {
        for kind in PayloadKind::ALL {
            assert!(!(kind.is_media() && kind.is_text()), "{kind} is both");
        }
        assert!(PayloadKind::VoiceNote.is_media());
        assert!(PayloadKind::ExtendedText.is_text());
        assert!(!PayloadKind::Protocol.is_media());
    }

    #[test]
    fn payload_deserializes_from_tagged_json() {
        let payload: Payload =
            serde_json::from_str(r#"{"type":"protocol","kind":"revoke","target_id":"ABC"}"#)
                .unwrap();
        assert_eq!(
            payload,
            Payload::Protocol {
                kind: ProtocolKind::Revoke,
                target_id: Some("ABC".into()),
            }
        );
        assert_eq!(payload.kind(), PayloadKind::Protocol);
    }

    #[test]
    fn text_only_for_text_payloads() {
        let text = Payload::ExtendedText {
            text: "hi".into(),
            quoted_text: None,
        };
        assert_eq!(text.text(), Some("hi"));
        let image = Payload::Image {
            caption: Some("caption".into()),
        };
        assert_eq!(image.text(), None);
    }

    proptest::proptest! {
        #[test]
        fn bare_id_never_contains_decorations(raw in "[0-9a-z:@.]{0,40}") {
            let bare = bare_id(&raw);
            proptest::prop_assert!(!bare.contains('@'));
            proptest::prop_assert!(!bare.contains(':'));
            proptest::prop_assert!(raw.starts_with(bare));
        }
    }
}
