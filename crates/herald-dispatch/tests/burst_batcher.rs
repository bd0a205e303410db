// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! BurstBatcher timing, ordering and failure isolation.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use herald_core::{AuthId, ChatEvent, HeraldError, TenantId, TenantSession};
use herald_dispatch::{BatchItem, BatchProcessor, BurstBatcher, InMemoryBurstQueues};
use herald_router::normalize;
use herald_test_utils::{EventBuilder, MockTransport};
use tokio::time::{Instant, sleep};
use tokio_util::task::TaskTracker;

const DELAY: Duration = Duration::from_secs(1);

#[derive(Default)]
struct Recorder {
    processed: Mutex<Vec<(String, Duration)>>,
    fail_on: Option<String>,
    origin: Option<Instant>,
}

impl Recorder {
    fn started_at(origin: Instant) -> Self {
        Self {
            origin: Some(origin),
            ..Self::default()
        }
    }

    fn ids(&self) -> Vec<String> {
        self.processed
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }
}

#[async_trait]
impl BatchProcessor for Recorder {
    async fn process(
        &self,
        _session: &TenantSession,
        event: &ChatEvent,
    ) -> Result<(), HeraldError> {
        let at = self.origin.map(|o| o.elapsed()).unwrap_or_default();
        self.processed.lock().unwrap().push((event.id.clone(), at));
        if self.fail_on.as_deref() == Some(event.id.as_str()) {
            return Err(HeraldError::transport("reaction rejected"));
        }
        Ok(())
    }
}

fn session(tenant: &str) -> TenantSession {
    TenantSession::new(
        TenantId::new(tenant),
        AuthId::new("auth"),
        Arc::new(MockTransport::new()),
    )
}

fn item(seq: u64, session: &TenantSession, id: &str) -> BatchItem {
    let raw = EventBuilder::new(id).status("5511").build();
    BatchItem {
        seq,
        session: session.clone(),
        event: Arc::new(normalize(raw, None, Utc::now()).unwrap()),
    }
}

fn batcher(processor: Arc<Recorder>, tasks: &TaskTracker) -> BurstBatcher {
    BurstBatcher::new(
        Arc::new(InMemoryBurstQueues::new()),
        processor,
        DELAY,
        tasks.clone(),
    )
}

#[tokio::test(start_paused = true)]
async fn burst_flushes_once_in_order_then_reopens() {
    let origin = Instant::now();
    let recorder = Arc::new(Recorder::started_at(origin));
    let tasks = TaskTracker::new();
    let batcher = batcher(Arc::clone(&recorder), &tasks);
    let tenant = session("tenant-x");

    for (seq, id) in ["S1", "S2", "S3", "S4", "S5"].iter().enumerate() {
        batcher.submit(item(seq as u64, &tenant, id));
        sleep(Duration::from_millis(40)).await;
    }
    assert_eq!(batcher.pending(&tenant.tenant_id), 5);

    sleep(Duration::from_millis(750)).await;
    assert!(recorder.ids().is_empty(), "flushed before the delay elapsed");

    sleep(Duration::from_millis(300)).await;
    assert_eq!(recorder.ids(), ["S1", "S2", "S3", "S4", "S5"]);
    assert_eq!(batcher.pending(&tenant.tenant_id), 0);
    for (_, at) in recorder.processed.lock().unwrap().iter() {
        assert_eq!(*at, DELAY, "every event of the batch flushes on the first timer");
    }

    // 1.5s after the first event: a new batch with its own timer.
    sleep(Duration::from_millis(410)).await;
    batcher.submit(item(5, &tenant, "S6"));
    assert_eq!(batcher.pending(&tenant.tenant_id), 1);

    sleep(Duration::from_millis(900)).await;
    assert_eq!(recorder.ids().len(), 5);

    sleep(Duration::from_millis(200)).await;
    assert_eq!(recorder.ids().last().map(String::as_str), Some("S6"));

    tasks.close();
    tasks.wait().await;
}

#[tokio::test(start_paused = true)]
async fn failed_item_does_not_abort_batch() {
    let recorder = Arc::new(Recorder {
        fail_on: Some("S2".into()),
        ..Recorder::default()
    });
    let tasks = TaskTracker::new();
    let batcher = batcher(Arc::clone(&recorder), &tasks);
    let tenant = session("tenant-x");

    for (seq, id) in ["S1", "S2", "S3"].iter().enumerate() {
        batcher.submit(item(seq as u64, &tenant, id));
    }
    tasks.close();
    tasks.wait().await;

    assert_eq!(recorder.ids(), ["S1", "S2", "S3"]);
}

#[tokio::test(start_paused = true)]
async fn batch_processes_in_admission_order() {
    let recorder = Arc::new(Recorder::default());
    let tasks = TaskTracker::new();
    let batcher = batcher(Arc::clone(&recorder), &tasks);
    let tenant = session("tenant-x");

    batcher.submit(item(7, &tenant, "late"));
    batcher.submit(item(3, &tenant, "early"));
    batcher.submit(item(5, &tenant, "middle"));
    tasks.close();
    tasks.wait().await;

    assert_eq!(recorder.ids(), ["early", "middle", "late"]);
}

#[tokio::test(start_paused = true)]
async fn tenants_batch_independently() {
    let recorder = Arc::new(Recorder::default());
    let tasks = TaskTracker::new();
    let batcher = batcher(Arc::clone(&recorder), &tasks);
    let a = session("tenant-a");
    let b = session("tenant-b");

    batcher.submit(item(0, &a, "A1"));
    batcher.submit(item(1, &b, "B1"));
    batcher.submit(item(2, &a, "A2"));
    assert_eq!(batcher.pending(&a.tenant_id), 2);
    assert_eq!(batcher.pending(&b.tenant_id), 1);

    tasks.close();
    tasks.wait().await;

    let ids = recorder.ids();
    assert_eq!(ids.len(), 3);
    let a_order: Vec<_> = ids.iter().filter(|id| id.starts_with('A')).collect();
    assert_eq!(a_order, ["A1", "A2"]);
}
