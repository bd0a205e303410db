// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Flush-time processing of status broadcasts: view and react.

use std::sync::Arc;

use async_trait::async_trait;
use herald_core::{ChatEvent, FeatureFlags, HeraldError, TenantSession};
use tracing::{debug, warn};

use crate::batcher::BatchProcessor;
use crate::cache::ConfigCache;

/// Marks status broadcasts as seen and reacts to them when the tenant has
/// `status_seen` enabled.
pub struct StatusViewer {
    features: Arc<ConfigCache<FeatureFlags>>,
    reaction: String,
}

impl StatusViewer {
    pub fn new(features: Arc<ConfigCache<FeatureFlags>>, reaction: impl Into<String>) -> Self {
        Self {
            features,
            reaction: reaction.into(),
        }
    }

    pub fn reaction(&self) -> &str {
        &self.reaction
    }
}

/// Status reactions go to the poster and to the tenant's own identity.
fn reaction_recipients(session: &TenantSession, event: &ChatEvent) -> Vec<String> {
    let poster = event
        .key
        .participant
        .clone()
        .or_else(|| event.key.remote_jid.clone())
        .unwrap_or_else(|| event.sender.clone());
    let mut recipients = vec![poster];
    if let Some(own) = session.transport.own_id() {
        recipients.push(own.to_string());
    }
    recipients
}

#[async_trait]
impl BatchProcessor for StatusViewer {
    async fn process(
        &self,
        session: &TenantSession,
        event: &ChatEvent,
    ) -> Result<(), HeraldError> {
        let flags = self.features.get(&session.tenant_id).await.into_value();
        if !flags.status_seen {
            debug!(tenant_id = %session.tenant_id, event_id = %event.id, "status viewing disabled");
            return Ok(());
        }

        if let Err(e) = session
            .transport
            .mark_read(std::slice::from_ref(&event.key))
            .await
        {
            warn!(tenant_id = %session.tenant_id, event_id = %event.id, error = %e, "failed to mark status read");
        }

        let recipients = reaction_recipients(session, event);
        session
            .transport
            .send_reaction(&event.key, &self.reaction, &recipients)
            .await
    }
}
