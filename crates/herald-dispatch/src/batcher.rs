// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-tenant coalescing of status events into timed batches.
//!
//! The first event for a tenant with no open batch opens one and arms a single
//! flush timer. Later events join the open batch without re-arming. When the
//! timer fires the batch is taken out of the table atomically and its events
//! are processed one at a time in admission order. A failed item is logged and
//! the rest of the batch still runs.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use herald_core::{ChatEvent, HeraldError, TenantId, TenantSession};
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

/// One queued status event.
#[derive(Debug, Clone)]
pub struct BatchItem {
    /// Admission sequence number; batches flush in this order.
    pub seq: u64,
    pub session: TenantSession,
    pub event: Arc<ChatEvent>,
}

/// Table of open batches keyed by tenant.
pub trait BurstQueueStore: Send + Sync {
    /// Appends to the tenant's batch. Returns `true` if this opened the batch.
    fn push(&self, tenant: &TenantId, item: BatchItem) -> bool;

    /// Removes and returns the tenant's batch, closing it.
    fn take(&self, tenant: &TenantId) -> Vec<BatchItem>;

    /// Number of events waiting in the tenant's open batch.
    fn depth(&self, tenant: &TenantId) -> usize;
}

/// Process-local [`BurstQueueStore`].
#[derive(Debug, Default)]
pub struct InMemoryBurstQueues {
    batches: DashMap<TenantId, Vec<BatchItem>>,
}

impl InMemoryBurstQueues {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BurstQueueStore for InMemoryBurstQueues {
    fn push(&self, tenant: &TenantId, item: BatchItem) -> bool {
        match self.batches.entry(tenant.clone()) {
            Entry::Occupied(mut batch) => {
                batch.get_mut().push(item);
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(vec![item]);
                true
            }
        }
    }

    fn take(&self, tenant: &TenantId) -> Vec<BatchItem> {
        self.batches
            .remove(tenant)
            .map(|(_, items)| items)
            .unwrap_or_default()
    }

    fn depth(&self, tenant: &TenantId) -> usize {
        self.batches.get(tenant).map_or(0, |batch| batch.len())
    }
}

/// Handles one flushed status event.
#[async_trait]
pub trait BatchProcessor: Send + Sync {
    async fn process(&self, session: &TenantSession, event: &ChatEvent)
    -> Result<(), HeraldError>;
}

/// Coalesces status events per tenant and flushes them after a fixed delay.
pub struct BurstBatcher {
    queues: Arc<dyn BurstQueueStore>,
    processor: Arc<dyn BatchProcessor>,
    delay: Duration,
    tasks: TaskTracker,
}

impl BurstBatcher {
    pub fn new(
        queues: Arc<dyn BurstQueueStore>,
        processor: Arc<dyn BatchProcessor>,
        delay: Duration,
        tasks: TaskTracker,
    ) -> Self {
        Self {
            queues,
            processor,
            delay,
            tasks,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Events waiting in the tenant's open batch.
    pub fn pending(&self, tenant: &TenantId) -> usize {
        self.queues.depth(tenant)
    }

    /// Queues a status event, arming the flush timer if this opens a batch.
    pub fn submit(&self, item: BatchItem) {
        let tenant = item.session.tenant_id.clone();
        if !self.queues.push(&tenant, item) {
            return;
        }

        debug!(tenant_id = %tenant, delay_ms = self.delay.as_millis() as u64, "status batch opened");
        let queues = Arc::clone(&self.queues);
        let processor = Arc::clone(&self.processor);
        let delay = self.delay;
        self.tasks.spawn(async move {
            tokio::time::sleep(delay).await;
            flush(queues.as_ref(), processor.as_ref(), &tenant).await;
        });
    }
}

async fn flush(queues: &dyn BurstQueueStore, processor: &dyn BatchProcessor, tenant: &TenantId) {
    let mut batch = queues.take(tenant);
    batch.sort_by_key(|item| item.seq);
    debug!(tenant_id = %tenant, size = batch.len(), "flushing status batch");

    let mut failed = 0usize;
    for item in &batch {
        if let Err(e) = processor.process(&item.session, &item.event).await {
            failed += 1;
            warn!(
                tenant_id = %tenant,
                event_id = %item.event.id,
                error = %e,
                "status event processing failed"
            );
        }
    }

    if failed > 0 {
        warn!(tenant_id = %tenant, failed, total = batch.len(), "status batch flushed with failures");
    }
}

impl std::fmt::Debug for BurstBatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BurstBatcher")
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}
