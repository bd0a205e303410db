// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat transport boundary: event delivery plus best-effort side-effect primitives.

use async_trait::async_trait;

use crate::error::HeraldError;
use crate::event::{EventKey, InboundEvent};
use crate::settings::PresenceKind;
use crate::traits::adapter::PluginAdapter;

/// One tenant's connection to the chat network.
///
/// Connection management, encryption and reconnection live behind this trait.
/// Every send primitive is best-effort: callers log failures and never retry.
#[async_trait]
pub trait Transport: PluginAdapter {
    /// The bot's own bare identifier on the network, once known.
    fn own_id(&self) -> Option<&str> {
        None
    }

    /// Waits for the next inbound event. `Ok(None)` means the stream ended.
    async fn next_event(&self) -> Result<Option<InboundEvent>, HeraldError>;

    /// Status broadcasts posted while the tenant was offline and not yet
    /// viewed. Transports without such a query report none.
    async fn fetch_unseen_statuses(&self) -> Result<Vec<InboundEvent>, HeraldError> {
        Ok(Vec::new())
    }

    /// Reacts to an event with an emoji, delivered to `recipients`.
    async fn send_reaction(
        &self,
        key: &EventKey,
        emoji: &str,
        recipients: &[String],
    ) -> Result<(), HeraldError>;

    /// Sends read receipts for the given events.
    async fn mark_read(&self, keys: &[EventKey]) -> Result<(), HeraldError>;

    /// Advertises a presence state in a chat.
    async fn set_presence(&self, chat_id: &str, presence: PresenceKind)
    -> Result<(), HeraldError>;
}
