// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command interpreter invoked for prefixed plain messages.

use async_trait::async_trait;

use crate::error::HeraldError;
use crate::event::ChatEvent;
use crate::settings::{CommandPrefix, OperatingMode};
use crate::types::{SubscriptionTier, TenantSession};

/// A command hand-off. `text` is the full message text, prefix included.
#[derive(Debug, Clone, Copy)]
pub struct CommandRequest<'a> {
    pub session: &'a TenantSession,
    pub event: &'a ChatEvent,
    pub text: &'a str,
    pub tier: &'a SubscriptionTier,
    pub prefix: &'a CommandPrefix,
    pub mode: OperatingMode,
}

impl CommandRequest<'_> {
    /// The text after the prefix, trimmed.
    pub fn body(&self) -> &str {
        self.text
            .strip_prefix(self.prefix.as_str())
            .unwrap_or(self.text)
            .trim()
    }
}

#[async_trait]
pub trait CommandInterpreter: Send + Sync {
    async fn execute(&self, request: CommandRequest<'_>) -> Result<(), HeraldError>;
}
