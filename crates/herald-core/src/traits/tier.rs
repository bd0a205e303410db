// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subscription tier lookup. Caching is the collaborator's concern.

use async_trait::async_trait;

use crate::error::HeraldError;
use crate::types::{AuthId, SubscriptionTier};

#[async_trait]
pub trait TierSource: Send + Sync {
    async fn tier(&self, auth: &AuthId) -> Result<SubscriptionTier, HeraldError>;
}
