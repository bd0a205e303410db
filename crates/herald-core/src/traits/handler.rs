// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Downstream category handlers (poll vote, media, pending reply, delete notice).

use async_trait::async_trait;

use crate::error::HeraldError;
use crate::event::ChatEvent;
use crate::types::{SubscriptionTier, TenantSession};

/// Input to a category handler.
#[derive(Debug, Clone, Copy)]
pub struct HandlerInput<'a> {
    pub session: &'a TenantSession,
    pub event: &'a ChatEvent,
    pub tier: &'a SubscriptionTier,
    /// For delete notices: the revoked message, if still in the chat log.
    pub related: Option<&'a ChatEvent>,
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Short name used in logs and error context.
    fn name(&self) -> &str;

    async fn handle(&self, input: HandlerInput<'_>) -> Result<(), HeraldError>;
}
