// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fire-and-forget processing metrics.

use std::time::Duration;

use crate::types::{AuthId, TenantId};

/// One dispatch's timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessingSample {
    pub processing_time: Duration,
}

impl ProcessingSample {
    pub fn processing_time_ms(&self) -> u64 {
        u64::try_from(self.processing_time.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Records dispatch metrics. Implementations must not block or fail.
pub trait MetricsSink: Send + Sync {
    fn record(&self, tenant: &TenantId, auth: &AuthId, sample: ProcessingSample);

    /// An event was routed to `category`.
    fn event_routed(&self, _category: &str) {}

    /// A dispatch step failed and was isolated.
    fn stage_failed(&self, _stage: &str) {}

    /// The security gate blocked an event.
    fn security_blocked(&self, _tenant: &TenantId) {}
}
