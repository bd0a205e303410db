// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock transport for deterministic testing.
//!
//! `MockTransport` implements `Transport` with injectable inbound events and
//! captured reactions, read receipts and presence updates.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use herald_core::{
    AdapterType, EventKey, HealthStatus, HeraldError, InboundEvent, PluginAdapter, PresenceKind,
    Transport,
};

/// A reaction captured by [`MockTransport::send_reaction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentReaction {
    pub key: EventKey,
    pub emoji: String,
    pub recipients: Vec<String>,
}

/// A mock chat transport for testing.
///
/// Events injected via `inject_event()` are returned by `next_event()` in
/// order. Once `close()` is called and the queue is empty, `next_event()`
/// reports the end of the stream.
pub struct MockTransport {
    own_id: Option<String>,
    inbound: Arc<Mutex<VecDeque<InboundEvent>>>,
    unseen: Arc<Mutex<Vec<InboundEvent>>>,
    notify: Arc<Notify>,
    closed: AtomicBool,
    failing: AtomicBool,
    reactions: Arc<Mutex<Vec<SentReaction>>>,
    reads: Arc<Mutex<Vec<EventKey>>>,
    presence: Arc<Mutex<Vec<(String, PresenceKind)>>>,
}

impl MockTransport {
    /// Create a new mock transport with empty queues.
    pub fn new() -> Self {
        Self {
            own_id: None,
            inbound: Arc::new(Mutex::new(VecDeque::new())),
            unseen: Arc::new(Mutex::new(Vec::new())),
            notify: Arc::new(Notify::new()),
            closed: AtomicBool::new(false),
            failing: AtomicBool::new(false),
            reactions: Arc::new(Mutex::new(Vec::new())),
            reads: Arc::new(Mutex::new(Vec::new())),
            presence: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set the bot's own identity on the network.
    pub fn with_own_id(mut self, own_id: impl Into<String>) -> Self {
        self.own_id = Some(own_id.into());
        self
    }

    /// Inject an inbound event into the receive queue.
    pub async fn inject_event(&self, event: InboundEvent) {
        self.inbound.lock().await.push_back(event);
        self.notify.notify_one();
    }

    /// Statuses handed out, once, by the next `fetch_unseen_statuses()`.
    pub async fn set_unseen_statuses(&self, statuses: Vec<InboundEvent>) {
        *self.unseen.lock().await = statuses;
    }

    /// End the stream once the queue drains.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    /// Make every send primitive, and the unseen-status fetch, fail until reset.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn reactions(&self) -> Vec<SentReaction> {
        self.reactions.lock().await.clone()
    }

    pub async fn read_receipts(&self) -> Vec<EventKey> {
        self.reads.lock().await.clone()
    }

    pub async fn presence_updates(&self) -> Vec<(String, PresenceKind)> {
        self.presence.lock().await.clone()
    }

    fn check_failing(&self, op: &str) -> Result<(), HeraldError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(HeraldError::transport(format!("mock {op} failure")));
        }
        Ok(())
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockTransport {
    fn name(&self) -> &str {
        "mock-transport"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transport
    }

    async fn health_check(&self) -> Result<HealthStatus, HeraldError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), HeraldError> {
        self.close();
        Ok(())
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn own_id(&self) -> Option<&str> {
        self.own_id.as_deref()
    }

    async fn next_event(&self) -> Result<Option<InboundEvent>, HeraldError> {
        loop {
            {
                let mut queue = self.inbound.lock().await;
                if let Some(event) = queue.pop_front() {
                    return Ok(Some(event));
                }
                if self.closed.load(Ordering::SeqCst) {
                    return Ok(None);
                }
            }
            self.notify.notified().await;
        }
    }

    async fn fetch_unseen_statuses(&self) -> Result<Vec<InboundEvent>, HeraldError> {
        self.check_failing("status fetch")?;
        Ok(std::mem::take(&mut *self.unseen.lock().await))
    }

    async fn send_reaction(
        &self,
        key: &EventKey,
        emoji: &str,
        recipients: &[String],
    ) -> Result<(), HeraldError> {
        self.check_failing("reaction")?;
        self.reactions.lock().await.push(SentReaction {
            key: key.clone(),
            emoji: emoji.to_string(),
            recipients: recipients.to_vec(),
        });
        Ok(())
    }

    async fn mark_read(&self, keys: &[EventKey]) -> Result<(), HeraldError> {
        self.check_failing("read receipt")?;
        self.reads.lock().await.extend_from_slice(keys);
        Ok(())
    }

    async fn set_presence(
        &self,
        chat_id: &str,
        presence: PresenceKind,
    ) -> Result<(), HeraldError> {
        self.check_failing("presence")?;
        self.presence
            .lock()
            .await
            .push((chat_id.to_string(), presence));
        Ok(())
    }
}
