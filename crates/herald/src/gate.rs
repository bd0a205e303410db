// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in security gate: a static sender blocklist from `[security]`.

use std::collections::HashSet;

use async_trait::async_trait;
use herald_core::{HeraldError, SecurityCheck, SecurityGate, Verdict, bare_id};
use tracing::debug;

/// Blocks every event whose bare sender is on the list.
#[derive(Debug, Clone, Default)]
pub struct BlocklistGate {
    blocked: HashSet<String>,
}

impl BlocklistGate {
    /// Entries may carry transport decorations; they are stripped.
    pub fn new<I, S>(senders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            blocked: senders
                .into_iter()
                .map(|s| bare_id(s.as_ref().trim()).to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.blocked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocked.is_empty()
    }
}

#[async_trait]
impl SecurityGate for BlocklistGate {
    async fn check(&self, request: SecurityCheck<'_>) -> Result<Verdict, HeraldError> {
        if self.blocked.contains(&request.event.sender) {
            debug!(tenant_id = %request.tenant_id, sender = %request.event.sender, "sender on blocklist");
            return Ok(Verdict::Block {
                reason: format!("sender {} is blocked", request.event.sender),
            });
        }
        Ok(Verdict::Allow)
    }
}
