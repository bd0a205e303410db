// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mandatory security check run before any routing.

use async_trait::async_trait;

use crate::error::HeraldError;
use crate::event::ChatEvent;
use crate::types::{AuthId, SubscriptionTier, TenantId};

/// Everything the security collaborator sees about one event.
#[derive(Debug, Clone, Copy)]
pub struct SecurityCheck<'a> {
    pub tenant_id: &'a TenantId,
    pub auth_id: &'a AuthId,
    pub event: &'a ChatEvent,
    pub tier: &'a SubscriptionTier,
}

/// Decision of the security collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Block { reason: String },
}

/// Hard gate: a `Block` (or an error) ends the dispatch before classification.
#[async_trait]
pub trait SecurityGate: Send + Sync {
    async fn check(&self, request: SecurityCheck<'_>) -> Result<Verdict, HeraldError>;
}
