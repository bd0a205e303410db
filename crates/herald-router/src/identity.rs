// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity extraction: turns a raw transport envelope into a [`ChatEvent`].

use chrono::{DateTime, Utc};
use herald_core::{ChatEvent, Direction, HeraldError, InboundEvent, bare_id};

/// Normalizes a raw event.
///
/// The chat id comes from `remote_jid`; the sender is the group participant
/// when present, otherwise the chat itself, with `@domain` and `:device`
/// stripped. `own_id` is the bot's identity on the transport, used to flag
/// events the bot sent from another device.
///
/// Fails with [`HeraldError::MalformedEvent`] when the chat or sender cannot
/// be determined.
pub fn normalize(
    raw: InboundEvent,
    own_id: Option<&str>,
    received_at: DateTime<Utc>,
) -> Result<ChatEvent, HeraldError> {
    let chat_id = match raw.key.remote_jid.as_deref().map(str::trim) {
        Some(jid) if !jid.is_empty() => jid.to_string(),
        _ => return Err(HeraldError::malformed("event has no chat identifier")),
    };

    let sender_raw = raw
        .key
        .participant
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .unwrap_or(&chat_id);
    let sender = bare_id(sender_raw.trim()).to_string();
    if sender.is_empty() {
        return Err(HeraldError::malformed(format!(
            "cannot derive sender from `{sender_raw}`"
        )));
    }

    let from_bot_identity = own_id
        .map(bare_id)
        .is_some_and(|own| !own.is_empty() && own == sender);

    let direction = if raw.key.from_me {
        Direction::FromOperator
    } else {
        Direction::FromPeer
    };

    Ok(ChatEvent {
        id: raw.key.id.clone(),
        chat_id,
        sender,
        direction,
        from_bot_identity,
        push_name: raw.push_name,
        payload: raw.payload,
        key: raw.key,
        received_at,
    })
}
