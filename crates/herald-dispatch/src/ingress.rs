// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Multi-tenant ingress: aggregates every tenant's transport into one stream.
//!
//! One receive task per tenant forwards raw events into a shared unbounded
//! channel. The ingress loop admits events one at a time in the order they
//! come off the channel, then spawns a routing task per event. There is no
//! backpressure; only status events are coalesced, by the burst batcher.

use std::sync::Arc;
use std::time::Duration;

use herald_core::{InboundEvent, TenantSession};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::dispatcher::{Admission, Dispatcher};
use crate::shutdown::drain_in_flight;

const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Counters for one ingress run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngressSummary {
    pub received: u64,
    pub admitted: u64,
    pub dropped: u64,
}

/// Feeds events from every tenant session into a shared [`Dispatcher`].
pub struct Ingress {
    dispatcher: Arc<Dispatcher>,
    sessions: Vec<TenantSession>,
    retry_delay: Duration,
}

impl Ingress {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            sessions: Vec::new(),
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Registers a tenant session. Must be called before [`Ingress::run`].
    pub fn add_session(&mut self, session: TenantSession) {
        self.sessions.push(session);
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Pause before polling a transport again after a receive error.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Runs until `cancel` fires or every transport stream ends, then waits
    /// for in-flight dispatches and batch flushes to complete.
    ///
    /// Each tenant's missed statuses are caught up once, alongside its
    /// receive task.
    pub async fn run(self, cancel: CancellationToken) -> IngressSummary {
        let (tx, mut rx) = mpsc::unbounded_channel::<(TenantSession, InboundEvent)>();
        let receivers = TaskTracker::new();

        for session in self.sessions {
            info!(tenant_id = %session.tenant_id, transport = session.transport.name(), "tenant connected to ingress");
            let dispatcher = Arc::clone(&self.dispatcher);
            let catch_up = session.clone();
            self.dispatcher.tasks().spawn(async move {
                dispatcher.catch_up_statuses(&catch_up).await;
            });
            let tx = tx.clone();
            let cancel = cancel.clone();
            let retry_delay = self.retry_delay;
            receivers.spawn(receive_loop(session, tx, cancel, retry_delay));
        }
        // Only the receive tasks hold senders now; the channel closes when
        // the last stream ends.
        drop(tx);
        receivers.close();

        let mut summary = IngressSummary::default();
        loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => None,
                item = rx.recv() => item,
            };
            let Some((session, raw)) = next else {
                break;
            };

            summary.received += 1;
            match self.dispatcher.admit(&session, raw) {
                Admission::Admitted(admitted) => {
                    summary.admitted += 1;
                    let dispatcher = Arc::clone(&self.dispatcher);
                    self.dispatcher.tasks().spawn(async move {
                        dispatcher.route(admitted).await;
                    });
                }
                Admission::Dropped(report) => {
                    summary.dropped += 1;
                    debug!(tenant_id = %report.tenant_id, event_id = %report.event_id, "event dropped at admission");
                }
            }
        }

        info!(
            received = summary.received,
            admitted = summary.admitted,
            dropped = summary.dropped,
            "ingress stopped receiving"
        );
        receivers.wait().await;
        drain_in_flight(self.dispatcher.tasks()).await;
        summary
    }
}

async fn receive_loop(
    session: TenantSession,
    tx: mpsc::UnboundedSender<(TenantSession, InboundEvent)>,
    cancel: CancellationToken,
    retry_delay: Duration,
) {
    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => break,
            next = session.transport.next_event() => next,
        };
        match next {
            Ok(Some(raw)) => {
                if tx.send((session.clone(), raw)).is_err() {
                    // Ingress loop is gone.
                    break;
                }
            }
            Ok(None) => {
                info!(tenant_id = %session.tenant_id, "transport stream ended");
                break;
            }
            Err(e) => {
                warn!(tenant_id = %session.tenant_id, error = %e, "transport receive failed, retrying");
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(retry_delay) => {}
                }
            }
        }
    }
    debug!(tenant_id = %session.tenant_id, "receive task exited");
}

impl std::fmt::Debug for Ingress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ingress")
            .field("sessions", &self.sessions)
            .field("retry_delay", &self.retry_delay)
            .finish_non_exhaustive()
    }
}
