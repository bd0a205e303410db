// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The dispatcher: single sequencing authority for one inbound event.
//!
//! Dispatch is split in two. [`Dispatcher::admit`] is synchronous and runs in
//! arrival order: it normalizes identities, appends group events to the chat
//! log and hands out a sequence number. [`Dispatcher::route`] does everything
//! that awaits: standing side effects, tenant bookkeeping, tier, the security
//! gate, classification and the hand-off to exactly one handler.
//!
//! Nothing escapes as an error. Every event ends in a [`DispatchReport`] whose
//! [`DispatchOutcome`] says what happened, and the processing time is always
//! recorded to the metrics sink.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use herald_core::{
    AuthId, ChatEvent, CommandInterpreter, CommandPrefix, CommandRequest, EventHandler,
    FeatureFlags, HandlerInput, HeraldError, InboundEvent, MetricsSink, OperatingMode, Payload,
    ProcessingSample, ProtocolKind, SecurityCheck, SecurityGate, SubscriptionTier, TenantId,
    TenantSession, TenantSettingsStore, TierSource, Verdict,
};
use herald_router::{AmbientFlags, Category, Classification, EventClassifier, normalize};
use herald_session::SessionStateStore;
use strum::{Display, IntoStaticStr};
use tokio::time::Instant;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, trace, warn};

use crate::batcher::{BatchItem, BatchProcessor, BurstBatcher, BurstQueueStore, InMemoryBurstQueues};
use crate::cache::SettingsCaches;
use crate::presence::PresenceThrottle;
use crate::settings::DispatchSettings;
use crate::status::StatusViewer;

/// Step whose failure ended a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum DispatchStage {
    Handler,
    Command,
}

impl DispatchStage {
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// Terminal state of one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Identity could not be extracted; the event was dropped.
    Dropped { reason: String },
    /// The security gate blocked the event.
    Blocked { reason: String },
    /// The security check itself failed; treated as a block.
    SecurityFailed { error: String },
    /// Handed to the category's handler. `command` is set when a plain
    /// message was also run through the command interpreter.
    Routed { category: Category, command: bool },
    /// Classified into a category that has no handler.
    Ignored { category: Category },
    /// The handler or interpreter failed; side effects already committed stay.
    Failed {
        category: Category,
        stage: DispatchStage,
        error: String,
    },
}

impl DispatchOutcome {
    pub fn category(&self) -> Option<Category> {
        match self {
            DispatchOutcome::Routed { category, .. }
            | DispatchOutcome::Ignored { category }
            | DispatchOutcome::Failed { category, .. } => Some(*category),
            _ => None,
        }
    }

    pub fn is_routed(&self) -> bool {
        matches!(self, DispatchOutcome::Routed { .. })
    }
}

/// Summary of one dispatch, returned instead of an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub tenant_id: TenantId,
    pub event_id: String,
    pub seq: u64,
    pub outcome: DispatchOutcome,
    pub elapsed: Duration,
}

/// An event that passed admission and is ready for [`Dispatcher::route`].
#[derive(Debug)]
pub struct Admitted {
    pub seq: u64,
    pub session: TenantSession,
    pub event: Arc<ChatEvent>,
    started: Instant,
}

/// Result of [`Dispatcher::admit`].
#[derive(Debug)]
pub enum Admission {
    Admitted(Admitted),
    Dropped(DispatchReport),
}

/// Downstream handlers, one per category that has one.
#[derive(Clone)]
pub struct Handlers {
    pub poll_vote: Arc<dyn EventHandler>,
    pub media: Arc<dyn EventHandler>,
    pub pending_reply: Arc<dyn EventHandler>,
    pub delete_notice: Arc<dyn EventHandler>,
}

impl Default for Handlers {
    fn default() -> Self {
        Self {
            poll_vote: Arc::new(NoopHandler::new("poll_vote")),
            media: Arc::new(NoopHandler::new("media")),
            pending_reply: Arc::new(NoopHandler::new("pending_reply")),
            delete_notice: Arc::new(NoopHandler::new("delete_notice")),
        }
    }
}

/// Handler that accepts every event and does nothing.
#[derive(Debug, Clone)]
pub struct NoopHandler {
    name: &'static str,
}

impl NoopHandler {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

#[async_trait]
impl EventHandler for NoopHandler {
    fn name(&self) -> &str {
        self.name
    }

    async fn handle(&self, input: HandlerInput<'_>) -> Result<(), HeraldError> {
        trace!(handler = self.name, event_id = %input.event.id, "no-op handler");
        Ok(())
    }
}

/// Tier source that reports the same tier for everyone.
#[derive(Debug, Clone, Default)]
pub struct FixedTier(pub SubscriptionTier);

#[async_trait]
impl TierSource for FixedTier {
    async fn tier(&self, _auth: &AuthId) -> Result<SubscriptionTier, HeraldError> {
        Ok(self.0.clone())
    }
}

/// Metrics sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn record(&self, _tenant: &TenantId, _auth: &AuthId, _sample: ProcessingSample) {}
}

/// Sequences security, classification and hand-off for each inbound event.
pub struct Dispatcher {
    settings: DispatchSettings,
    classifier: EventClassifier,
    state: SessionStateStore,
    caches: SettingsCaches,
    store: Arc<dyn TenantSettingsStore>,
    tiers: Arc<dyn TierSource>,
    security: Arc<dyn SecurityGate>,
    interpreter: Arc<dyn CommandInterpreter>,
    handlers: Handlers,
    metrics: Arc<dyn MetricsSink>,
    batcher: BurstBatcher,
    status_processor: Arc<dyn BatchProcessor>,
    presence: PresenceThrottle,
    sequence: AtomicU64,
    tasks: TaskTracker,
}

impl Dispatcher {
    pub fn builder(
        store: Arc<dyn TenantSettingsStore>,
        security: Arc<dyn SecurityGate>,
        interpreter: Arc<dyn CommandInterpreter>,
    ) -> DispatcherBuilder {
        DispatcherBuilder::new(store, security, interpreter)
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    pub fn state(&self) -> &SessionStateStore {
        &self.state
    }

    pub fn caches(&self) -> &SettingsCaches {
        &self.caches
    }

    pub fn batcher(&self) -> &BurstBatcher {
        &self.batcher
    }

    /// Tracker of spawned routing tasks and batch timers.
    pub fn tasks(&self) -> &TaskTracker {
        &self.tasks
    }

    /// Views the statuses the tenant missed while offline.
    ///
    /// Does nothing unless `status_seen` is on. Each unseen status goes
    /// through the status processor on its own; a failure is logged and the
    /// rest continue. Returns how many were processed.
    pub async fn catch_up_statuses(&self, session: &TenantSession) -> usize {
        let tenant = &session.tenant_id;
        let flags = self.caches.features.get(tenant).await.into_value();
        if !flags.status_seen {
            debug!(tenant_id = %tenant, "status viewing disabled, skipping catch-up");
            return 0;
        }

        let unseen = match session.transport.fetch_unseen_statuses().await {
            Ok(unseen) => unseen,
            Err(e) => {
                warn!(tenant_id = %tenant, error = %e, "failed to fetch unseen statuses");
                self.metrics.stage_failed("status_catch_up");
                return 0;
            }
        };
        if unseen.is_empty() {
            debug!(tenant_id = %tenant, "no unseen statuses");
            return 0;
        }

        let mut viewed = 0;
        for raw in unseen {
            let event = match normalize(raw, session.transport.own_id(), Utc::now()) {
                Ok(event) => event,
                Err(e) => {
                    warn!(tenant_id = %tenant, error = %e, "skipping malformed unseen status");
                    self.metrics.stage_failed("normalize");
                    continue;
                }
            };
            match self.status_processor.process(session, &event).await {
                Ok(()) => viewed += 1,
                Err(e) => {
                    warn!(tenant_id = %tenant, event_id = %event.id, error = %e, "failed to view unseen status");
                    self.metrics.stage_failed("status_catch_up");
                }
            }
        }
        info!(tenant_id = %tenant, viewed, "unseen statuses viewed");
        viewed
    }

    /// Admits and routes one event.
    pub async fn dispatch(&self, session: &TenantSession, raw: InboundEvent) -> DispatchReport {
        match self.admit(session, raw) {
            Admission::Admitted(admitted) => self.route(admitted).await,
            Admission::Dropped(report) => report,
        }
    }

    /// Synchronous admission. Must be called in arrival order.
    ///
    /// Normalizes identities and appends group events to the chat log. A
    /// malformed event is dropped here, its time still recorded.
    pub fn admit(&self, session: &TenantSession, raw: InboundEvent) -> Admission {
        let started = Instant::now();
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        let event_id = raw.key.id.clone();

        let event = match normalize(raw, session.transport.own_id(), Utc::now()) {
            Ok(event) => Arc::new(event),
            Err(e) => {
                warn!(
                    tenant_id = %session.tenant_id,
                    event_id = %event_id,
                    error = %e,
                    "dropping malformed event"
                );
                self.metrics.stage_failed("normalize");
                let report = self.finish(
                    session,
                    event_id,
                    seq,
                    DispatchOutcome::Dropped {
                        reason: e.to_string(),
                    },
                    started,
                );
                return Admission::Dropped(report);
            }
        };

        if event.is_group() {
            self.state.append_message(&event.chat_id, seq, Arc::clone(&event));
        }
        debug!(
            tenant_id = %session.tenant_id,
            event_id = %event.id,
            seq,
            elapsed_us = started.elapsed().as_micros() as u64,
            "event admitted"
        );

        Admission::Admitted(Admitted {
            seq,
            session: session.clone(),
            event,
            started,
        })
    }

    /// Routes an admitted event to completion.
    pub async fn route(&self, admitted: Admitted) -> DispatchReport {
        let Admitted {
            seq,
            session,
            event,
            started,
        } = admitted;

        let outcome = self.run(seq, &session, &event).await;
        self.finish(&session, event.id.clone(), seq, outcome, started)
    }

    fn finish(
        &self,
        session: &TenantSession,
        event_id: String,
        seq: u64,
        outcome: DispatchOutcome,
        started: Instant,
    ) -> DispatchReport {
        let elapsed = started.elapsed();
        self.metrics.record(
            &session.tenant_id,
            &session.auth_id,
            ProcessingSample {
                processing_time: elapsed,
            },
        );
        debug!(
            tenant_id = %session.tenant_id,
            event_id = %event_id,
            elapsed_ms = elapsed.as_millis() as u64,
            "dispatch finished"
        );
        DispatchReport {
            tenant_id: session.tenant_id.clone(),
            event_id,
            seq,
            outcome,
            elapsed,
        }
    }

    async fn run(&self, seq: u64, session: &TenantSession, event: &Arc<ChatEvent>) -> DispatchOutcome {
        let tenant = &session.tenant_id;
        let flags = self.classifier.flags(event);

        let features = self.caches.features.get(tenant).await.into_value();
        self.apply_standing_effects(session, event, &features, flags)
            .await;

        match self.store.touch_tenant(tenant, &session.auth_id).await {
            Ok(true) => info!(tenant_id = %tenant, auth_id = %session.auth_id, "new tenant registered"),
            Ok(false) => {}
            Err(e) => {
                warn!(tenant_id = %tenant, error = %e, "failed to record tenant activity");
                self.metrics.stage_failed("touch_tenant");
            }
        }

        let tier = match self.tiers.tier(&session.auth_id).await {
            Ok(tier) => tier,
            Err(e) => {
                warn!(tenant_id = %tenant, error = %e, "tier lookup failed, assuming default tier");
                self.metrics.stage_failed("tier");
                SubscriptionTier::default()
            }
        };

        let security_started = Instant::now();
        let verdict = self
            .security
            .check(SecurityCheck {
                tenant_id: tenant,
                auth_id: &session.auth_id,
                event,
                tier: &tier,
            })
            .await;
        debug!(
            tenant_id = %tenant,
            elapsed_ms = security_started.elapsed().as_millis() as u64,
            "security check"
        );
        match verdict {
            Ok(Verdict::Allow) => {}
            Ok(Verdict::Block { reason }) => {
                info!(
                    tenant_id = %tenant,
                    chat_id = %event.chat_id,
                    sender = %event.sender,
                    reason = %reason,
                    "event blocked by security gate"
                );
                self.metrics.security_blocked(tenant);
                return DispatchOutcome::Blocked { reason };
            }
            Err(e) => {
                warn!(
                    tenant_id = %tenant,
                    chat_id = %event.chat_id,
                    error = %e,
                    "security check failed, dropping event"
                );
                self.metrics.stage_failed("security");
                return DispatchOutcome::SecurityFailed {
                    error: e.to_string(),
                };
            }
        }

        let prefix = self.caches.prefix.get(tenant).await.into_value();
        let mode = self.caches.mode.get(tenant).await.into_value();
        let counterpart = event.counterpart(tenant);
        let classification = match self.classifier.classify(event, &prefix, || {
            self.state.consume_pending_request(counterpart)
        }) {
            Ok(classification) => classification,
            Err(e) => {
                warn!(tenant_id = %tenant, event_id = %event.id, error = %e, "dropping unclassifiable event");
                return DispatchOutcome::Dropped {
                    reason: e.to_string(),
                };
            }
        };

        let routing_started = Instant::now();
        let outcome = self
            .route_category(seq, session, event, &tier, (&prefix, mode), classification)
            .await;
        debug!(
            tenant_id = %tenant,
            category = %classification.category,
            elapsed_ms = routing_started.elapsed().as_millis() as u64,
            "routing"
        );

        if outcome.is_routed() {
            info!(
                tenant_id = %tenant,
                chat_id = %event.chat_id,
                sender = %event.sender,
                category = %classification.category,
                command = classification.is_command,
                "event routed"
            );
            self.metrics.event_routed(classification.category.as_str());
        }
        outcome
    }

    /// Presence and read receipts. Best-effort: failures are only logged.
    async fn apply_standing_effects(
        &self,
        session: &TenantSession,
        event: &ChatEvent,
        features: &FeatureFlags,
        flags: AmbientFlags,
    ) {
        if flags.is_status_broadcast {
            return;
        }

        if let Some(presence) = features.presence {
            if self.presence.try_acquire(&event.chat_id) {
                if let Err(e) = session
                    .transport
                    .set_presence(&event.chat_id, presence)
                    .await
                {
                    warn!(tenant_id = %session.tenant_id, chat_id = %event.chat_id, error = %e, "failed to set presence");
                    self.metrics.stage_failed("presence");
                }
            }
        }

        if features.read_receipts && !flags.is_self_originated {
            if let Err(e) = session
                .transport
                .mark_read(std::slice::from_ref(&event.key))
                .await
            {
                warn!(tenant_id = %session.tenant_id, chat_id = %event.chat_id, error = %e, "failed to send read receipt");
                self.metrics.stage_failed("read_receipt");
            }
        }
    }

    async fn route_category(
        &self,
        seq: u64,
        session: &TenantSession,
        event: &Arc<ChatEvent>,
        tier: &SubscriptionTier,
        (prefix, mode): (&CommandPrefix, OperatingMode),
        classification: Classification,
    ) -> DispatchOutcome {
        let category = classification.category;
        let input = HandlerInput {
            session,
            event,
            tier,
            related: None,
        };

        match category {
            Category::PollVote => self.invoke(self.handlers.poll_vote.as_ref(), input, category).await,
            Category::StatusBroadcast => {
                self.batcher.submit(BatchItem {
                    seq,
                    session: session.clone(),
                    event: Arc::clone(event),
                });
                DispatchOutcome::Routed {
                    category,
                    command: false,
                }
            }
            Category::OwnStatus | Category::Unroutable => {
                debug!(tenant_id = %session.tenant_id, event_id = %event.id, category = %category, reason = classification.reason, "event ignored");
                DispatchOutcome::Ignored { category }
            }
            Category::Media => self.invoke(self.handlers.media.as_ref(), input, category).await,
            Category::PendingReply => {
                self.invoke(self.handlers.pending_reply.as_ref(), input, category)
                    .await
            }
            Category::DeleteNotice => {
                let revoked = revoked_target(event)
                    .and_then(|target| self.state.find_message(&event.chat_id, target));
                let input = HandlerInput {
                    related: revoked.as_ref().map(|entry| entry.event.as_ref()),
                    ..input
                };
                self.invoke(self.handlers.delete_notice.as_ref(), input, category)
                    .await
            }
            Category::PlainMessage => {
                self.plain_message(seq, session, event, tier, (prefix, mode), classification)
                    .await
            }
        }
    }

    async fn invoke(
        &self,
        handler: &dyn EventHandler,
        input: HandlerInput<'_>,
        category: Category,
    ) -> DispatchOutcome {
        match handler.handle(input).await {
            Ok(()) => DispatchOutcome::Routed {
                category,
                command: false,
            },
            Err(e) => {
                error!(
                    tenant_id = %input.session.tenant_id,
                    sender = %input.event.sender,
                    handler = handler.name(),
                    error = %e,
                    "handler failed"
                );
                self.metrics.stage_failed(DispatchStage::Handler.as_str());
                DispatchOutcome::Failed {
                    category,
                    stage: DispatchStage::Handler,
                    error: e.to_string(),
                }
            }
        }
    }

    /// Archival and activity always run; the interpreter runs in addition
    /// when the text starts with the tenant's prefix.
    async fn plain_message(
        &self,
        seq: u64,
        session: &TenantSession,
        event: &Arc<ChatEvent>,
        tier: &SubscriptionTier,
        (prefix, mode): (&CommandPrefix, OperatingMode),
        classification: Classification,
    ) -> DispatchOutcome {
        let category = classification.category;
        if event.is_group() {
            // Already archived at admission.
            let count = self.state.increment_activity(
                &event.chat_id,
                &event.sender,
                event.display_name(),
                &event.id,
            );
            trace!(chat_id = %event.chat_id, sender = %event.sender, count, "activity incremented");
        } else {
            self.state.append_message(&event.chat_id, seq, Arc::clone(event));
        }

        if !classification.is_command {
            return DispatchOutcome::Routed {
                category,
                command: false,
            };
        }

        let request = CommandRequest {
            session,
            event,
            text: event.text(),
            tier,
            prefix,
            mode,
        };
        match self.interpreter.execute(request).await {
            Ok(()) => DispatchOutcome::Routed {
                category,
                command: true,
            },
            Err(e) => {
                error!(
                    tenant_id = %session.tenant_id,
                    sender = %event.sender,
                    error = %e,
                    "command failed"
                );
                self.metrics.stage_failed(DispatchStage::Command.as_str());
                DispatchOutcome::Failed {
                    category,
                    stage: DispatchStage::Command,
                    error: e.to_string(),
                }
            }
        }
    }
}

fn revoked_target(event: &ChatEvent) -> Option<&str> {
    match event.payload.as_ref() {
        Some(Payload::Protocol {
            kind: ProtocolKind::Revoke,
            target_id,
        }) => target_id.as_deref(),
        _ => None,
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("settings", &self.settings)
            .field("state", &self.state)
            .field("sequence", &self.sequence)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Dispatcher`]. Collaborators not set fall back to
/// in-memory or no-op implementations.
pub struct DispatcherBuilder {
    settings: DispatchSettings,
    store: Arc<dyn TenantSettingsStore>,
    security: Arc<dyn SecurityGate>,
    interpreter: Arc<dyn CommandInterpreter>,
    caches: Option<SettingsCaches>,
    tiers: Option<Arc<dyn TierSource>>,
    handlers: Handlers,
    metrics: Option<Arc<dyn MetricsSink>>,
    state: Option<SessionStateStore>,
    burst_queues: Option<Arc<dyn BurstQueueStore>>,
    status_processor: Option<Arc<dyn BatchProcessor>>,
    tasks: Option<TaskTracker>,
}

impl DispatcherBuilder {
    fn new(
        store: Arc<dyn TenantSettingsStore>,
        security: Arc<dyn SecurityGate>,
        interpreter: Arc<dyn CommandInterpreter>,
    ) -> Self {
        Self {
            settings: DispatchSettings::default(),
            store,
            security,
            interpreter,
            caches: None,
            tiers: None,
            handlers: Handlers::default(),
            metrics: None,
            state: None,
            burst_queues: None,
            status_processor: None,
            tasks: None,
        }
    }

    pub fn settings(mut self, settings: DispatchSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Shares caches with another writer, such as a settings interpreter.
    pub fn caches(mut self, caches: SettingsCaches) -> Self {
        self.caches = Some(caches);
        self
    }

    pub fn tiers(mut self, tiers: Arc<dyn TierSource>) -> Self {
        self.tiers = Some(tiers);
        self
    }

    pub fn handlers(mut self, handlers: Handlers) -> Self {
        self.handlers = handlers;
        self
    }

    pub fn metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn state(mut self, state: SessionStateStore) -> Self {
        self.state = Some(state);
        self
    }

    pub fn burst_queues(mut self, queues: Arc<dyn BurstQueueStore>) -> Self {
        self.burst_queues = Some(queues);
        self
    }

    /// Replaces the default [`StatusViewer`] as the flush-time processor.
    pub fn status_processor(mut self, processor: Arc<dyn BatchProcessor>) -> Self {
        self.status_processor = Some(processor);
        self
    }

    pub fn tasks(mut self, tasks: TaskTracker) -> Self {
        self.tasks = Some(tasks);
        self
    }

    pub fn build(self) -> Dispatcher {
        let settings = self.settings;
        let caches = self
            .caches
            .unwrap_or_else(|| SettingsCaches::new(Arc::clone(&self.store), &settings));
        let tasks = self.tasks.unwrap_or_default();
        let processor = self.status_processor.unwrap_or_else(|| {
            Arc::new(StatusViewer::new(
                Arc::clone(&caches.features),
                settings.status_reaction.clone(),
            ))
        });
        let queues = self
            .burst_queues
            .unwrap_or_else(|| Arc::new(InMemoryBurstQueues::new()));
        let batcher = BurstBatcher::new(
            queues,
            Arc::clone(&processor),
            settings.status_batch_delay,
            tasks.clone(),
        );

        Dispatcher {
            classifier: EventClassifier::with_broadcast_chat(settings.broadcast_chat_id.clone()),
            state: self
                .state
                .unwrap_or_else(|| SessionStateStore::in_memory(settings.chat_log_capacity)),
            caches,
            store: self.store,
            tiers: self
                .tiers
                .unwrap_or_else(|| Arc::new(FixedTier::default())),
            security: self.security,
            interpreter: self.interpreter,
            handlers: self.handlers,
            metrics: self.metrics.unwrap_or_else(|| Arc::new(NoopMetrics)),
            batcher,
            status_processor: processor,
            presence: PresenceThrottle::new(settings.presence_cooldown),
            sequence: AtomicU64::new(0),
            tasks,
            settings,
        }
    }
}
