// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event classification with strict, short-circuiting precedence.
//!
//! The primary category is the first matching rule of:
//!
//! 1. poll-vote reply
//! 2. status broadcast (self-originated ones are discarded)
//! 3. media
//! 4. pending reply (direct chats only)
//! 5. delete notice
//! 6. plain message
//!
//! Command detection is a separate predicate evaluated only for plain
//! messages, so one event can be both archived and run as a command.

use herald_core::{
    BROADCAST_CHAT_ID, ChatEvent, CommandPrefix, HeraldError, Payload, PayloadKind, ProtocolKind,
};
use strum::{Display, IntoStaticStr};

/// Marker a bot-authored poll message carries in its text.
pub const POLL_MARKER: &str = "📊 Poll:";

/// Primary routing category of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Category {
    PollVote,
    StatusBroadcast,
    /// A status broadcast the tenant posted itself; discarded.
    OwnStatus,
    Media,
    PendingReply,
    DeleteNotice,
    PlainMessage,
    /// No rule matched (e.g. a non-revoke protocol message); a no-op.
    Unroutable,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// Ambient facts about an event that the rules consult.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmbientFlags {
    pub is_group: bool,
    pub is_status_broadcast: bool,
    pub is_self_originated: bool,
}

impl AmbientFlags {
    pub fn of(event: &ChatEvent, broadcast_chat_id: &str) -> Self {
        Self {
            is_group: event.is_group(),
            is_status_broadcast: event.chat_id == broadcast_chat_id,
            is_self_originated: event.is_self_originated(),
        }
    }
}

/// Outcome of classifying one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub category: Category,
    /// Plain message whose text starts with the tenant's prefix.
    pub is_command: bool,
    /// Human-readable reason for the classification.
    pub reason: &'static str,
}

impl Classification {
    fn primary(category: Category, reason: &'static str) -> Self {
        Self {
            category,
            is_command: false,
            reason,
        }
    }
}

/// Assigns each event exactly one primary category.
#[derive(Debug, Clone)]
pub struct EventClassifier {
    broadcast_chat_id: String,
}

impl EventClassifier {
    pub fn new() -> Self {
        Self::with_broadcast_chat(BROADCAST_CHAT_ID)
    }

    pub fn with_broadcast_chat(broadcast_chat_id: impl Into<String>) -> Self {
        Self {
            broadcast_chat_id: broadcast_chat_id.into(),
        }
    }

    pub fn broadcast_chat_id(&self) -> &str {
        &self.broadcast_chat_id
    }

    pub fn flags(&self, event: &ChatEvent) -> AmbientFlags {
        AmbientFlags::of(event, &self.broadcast_chat_id)
    }

    /// Classifies `event`.
    ///
    /// `consume_pending` is the atomic check-and-clear of the counterpart's
    /// pending request. It runs only when rules 1-3 did not match and the chat
    /// is direct, so a pending request is never spent on a poll vote, a status
    /// or a media message.
    pub fn classify(
        &self,
        event: &ChatEvent,
        prefix: &CommandPrefix,
        consume_pending: impl FnOnce() -> bool,
    ) -> Result<Classification, HeraldError> {
        if event.chat_id.is_empty() || event.sender.is_empty() {
            return Err(HeraldError::malformed("event has no chat or sender identity"));
        }
        let flags = self.flags(event);

        if is_poll_vote(event.payload.as_ref()) {
            return Ok(Classification::primary(
                Category::PollVote,
                "single-digit reply to a poll",
            ));
        }

        if flags.is_status_broadcast {
            return Ok(if flags.is_self_originated {
                Classification::primary(Category::OwnStatus, "own status broadcast")
            } else {
                Classification::primary(Category::StatusBroadcast, "status broadcast")
            });
        }

        let kind = event.kind();
        if kind.is_some_and(PayloadKind::is_media) {
            return Ok(Classification::primary(Category::Media, "media payload"));
        }

        if !flags.is_group && consume_pending() {
            return Ok(Classification::primary(
                Category::PendingReply,
                "direct reply to a pending request",
            ));
        }

        if is_revoke(event.payload.as_ref()) {
            return Ok(Classification::primary(
                Category::DeleteNotice,
                "message revoked",
            ));
        }

        if kind.is_some_and(PayloadKind::is_text) {
            return Ok(Classification {
                category: Category::PlainMessage,
                is_command: prefix.matches(event.text()),
                reason: "text message",
            });
        }

        Ok(Classification::primary(
            Category::Unroutable,
            "no routing rule matched",
        ))
    }
}

impl Default for EventClassifier {
    fn default() -> Self {
        Self::new()
    }
}

fn is_poll_vote(payload: Option<&Payload>) -> bool {
    match payload {
        Some(Payload::ExtendedText {
            text,
            quoted_text: Some(quoted),
        }) => {
            let mut chars = text.trim().chars();
            let single_digit = matches!((chars.next(), chars.next()), (Some('1'..='9'), None));
            single_digit && quoted.contains(POLL_MARKER)
        }
        _ => false,
    }
}

fn is_revoke(payload: Option<&Payload>) -> bool {
    matches!(
        payload,
        Some(Payload::Protocol {
            kind: ProtocolKind::Revoke,
            ..
        })
    )
}
