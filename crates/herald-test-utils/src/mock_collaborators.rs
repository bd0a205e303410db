// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recording doubles for the security gate, interpreter, handlers, tier
//! source and metrics sink.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use herald_core::{
    AuthId, CommandInterpreter, CommandRequest, EventHandler, HandlerInput, HeraldError,
    MetricsSink, OperatingMode, ProcessingSample, SecurityCheck, SecurityGate, SubscriptionTier,
    TenantId, TierSource, Verdict,
};

fn lock<T: Clone>(m: &Mutex<Vec<T>>) -> Vec<T> {
    m.lock().map(|v| v.clone()).unwrap_or_default()
}

fn push<T>(m: &Mutex<Vec<T>>, item: T) {
    if let Ok(mut v) = m.lock() {
        v.push(item);
    }
}

#[derive(Debug, Clone)]
enum SecurityBehavior {
    Allow,
    Block(String),
    Fail,
    /// Allow, but hold the check of one event id for a while.
    Stall(String, Duration),
}

/// Security gate with a fixed verdict that counts its checks.
#[derive(Debug)]
pub struct MockSecurity {
    behavior: SecurityBehavior,
    checks: AtomicUsize,
}

impl MockSecurity {
    pub fn allow() -> Self {
        Self::with(SecurityBehavior::Allow)
    }

    pub fn block(reason: &str) -> Self {
        Self::with(SecurityBehavior::Block(reason.to_string()))
    }

    /// Every check errors.
    pub fn failing() -> Self {
        Self::with(SecurityBehavior::Fail)
    }

    /// Allows everything, sleeping for `delay` before allowing `event_id`.
    pub fn stalling(event_id: &str, delay: Duration) -> Self {
        Self::with(SecurityBehavior::Stall(event_id.to_string(), delay))
    }

    fn with(behavior: SecurityBehavior) -> Self {
        Self {
            behavior,
            checks: AtomicUsize::new(0),
        }
    }

    pub fn checks(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecurityGate for MockSecurity {
    async fn check(&self, request: SecurityCheck<'_>) -> Result<Verdict, HeraldError> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            SecurityBehavior::Allow => Ok(Verdict::Allow),
            SecurityBehavior::Stall(event_id, delay) => {
                if request.event.id == *event_id {
                    tokio::time::sleep(*delay).await;
                }
                Ok(Verdict::Allow)
            }
            SecurityBehavior::Block(reason) => Ok(Verdict::Block {
                reason: reason.clone(),
            }),
            SecurityBehavior::Fail => Err(HeraldError::Internal(
                "mock security unavailable".to_string(),
            )),
        }
    }
}

/// A command the interpreter received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCommand {
    pub tenant_id: TenantId,
    pub auth_id: AuthId,
    pub event_id: String,
    pub text: String,
    pub body: String,
    pub tier: SubscriptionTier,
    pub mode: OperatingMode,
}

/// Interpreter that records every request.
#[derive(Debug, Default)]
pub struct RecordingInterpreter {
    requests: Mutex<Vec<RecordedCommand>>,
    fail: bool,
}

impl RecordingInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records, then fails every request.
    pub fn failing() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn requests(&self) -> Vec<RecordedCommand> {
        lock(&self.requests)
    }
}

#[async_trait]
impl CommandInterpreter for RecordingInterpreter {
    async fn execute(&self, request: CommandRequest<'_>) -> Result<(), HeraldError> {
        push(
            &self.requests,
            RecordedCommand {
                tenant_id: request.session.tenant_id.clone(),
                auth_id: request.session.auth_id.clone(),
                event_id: request.event.id.clone(),
                text: request.text.to_string(),
                body: request.body().to_string(),
                tier: request.tier.clone(),
                mode: request.mode,
            },
        );
        if self.fail {
            return Err(HeraldError::handler(
                "interpreter",
                std::io::Error::other("mock interpreter failure"),
            ));
        }
        Ok(())
    }
}

/// A handler invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandledEvent {
    pub event_id: String,
    pub chat_id: String,
    /// Id of the related (revoked) event, if one was resolved.
    pub related_id: Option<String>,
}

/// Handler that records every event it is given.
#[derive(Debug)]
pub struct RecordingHandler {
    name: String,
    calls: Mutex<Vec<HandledEvent>>,
    fail: bool,
}

impl RecordingHandler {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            calls: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    /// Records, then fails every call.
    pub fn failing(name: &str) -> Self {
        Self {
            fail: true,
            ..Self::new(name)
        }
    }

    pub fn calls(&self) -> Vec<HandledEvent> {
        lock(&self.calls)
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }
}

#[async_trait]
impl EventHandler for RecordingHandler {
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, input: HandlerInput<'_>) -> Result<(), HeraldError> {
        push(
            &self.calls,
            HandledEvent {
                event_id: input.event.id.clone(),
                chat_id: input.event.chat_id.clone(),
                related_id: input.related.map(|e| e.id.clone()),
            },
        );
        if self.fail {
            return Err(HeraldError::handler(
                self.name.clone(),
                std::io::Error::other("mock handler failure"),
            ));
        }
        Ok(())
    }
}

/// Tier source that always errors.
#[derive(Debug, Default)]
pub struct FailingTier;

#[async_trait]
impl TierSource for FailingTier {
    async fn tier(&self, _auth: &AuthId) -> Result<SubscriptionTier, HeraldError> {
        Err(HeraldError::Internal("tier service down".to_string()))
    }
}

/// Metrics sink that keeps everything it is told.
#[derive(Debug, Default)]
pub struct RecordingMetrics {
    samples: Mutex<Vec<(TenantId, AuthId, ProcessingSample)>>,
    routed: Mutex<Vec<String>>,
    failures: Mutex<Vec<String>>,
    blocks: Mutex<Vec<TenantId>>,
}

impl RecordingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn samples(&self) -> Vec<(TenantId, AuthId, ProcessingSample)> {
        lock(&self.samples)
    }

    pub fn routed(&self) -> Vec<String> {
        lock(&self.routed)
    }

    pub fn failures(&self) -> Vec<String> {
        lock(&self.failures)
    }

    pub fn blocks(&self) -> Vec<TenantId> {
        lock(&self.blocks)
    }
}

impl MetricsSink for RecordingMetrics {
    fn record(&self, tenant: &TenantId, auth: &AuthId, sample: ProcessingSample) {
        push(&self.samples, (tenant.clone(), auth.clone(), sample));
    }

    fn event_routed(&self, category: &str) {
        push(&self.routed, category.to_string());
    }

    fn stage_failed(&self, stage: &str) {
        push(&self.failures, stage.to_string());
    }

    fn security_blocked(&self, tenant: &TenantId) {
        push(&self.blocks, tenant.clone());
    }
}
