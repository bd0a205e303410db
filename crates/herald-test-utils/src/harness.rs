// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end dispatch testing.
//!
//! `TestHarness` assembles a complete dispatcher for one tenant with mock
//! collaborators and either an in-memory or a temp SQLite settings store.
//! `dispatch()` drives the full pipeline for one raw event.

use std::sync::Arc;

use herald_config::model::StorageConfig;
use herald_core::{
    AuthId, HeraldError, InboundEvent, SettingKey, TenantId, TenantSession, TenantSettingsStore,
    TierSource,
};
use herald_dispatch::{DispatchReport, DispatchSettings, Dispatcher, Handlers};
use herald_storage::SqliteSettingsStore;

use crate::mock_collaborators::{
    MockSecurity, RecordingHandler, RecordingInterpreter, RecordingMetrics,
};
use crate::mock_store::MockSettingsStore;
use crate::mock_transport::MockTransport;

/// Tenant used when the builder is not told otherwise.
pub const DEFAULT_TENANT: &str = "551199999";

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    tenant_id: String,
    auth_id: String,
    own_id: Option<String>,
    security: MockSecurity,
    interpreter: RecordingInterpreter,
    tiers: Option<Arc<dyn TierSource>>,
    settings: DispatchSettings,
    seeded: Vec<(SettingKey, String)>,
    sqlite: bool,
    failing_handlers: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            tenant_id: DEFAULT_TENANT.to_string(),
            auth_id: "auth-1".to_string(),
            own_id: None,
            security: MockSecurity::allow(),
            interpreter: RecordingInterpreter::new(),
            tiers: None,
            settings: DispatchSettings::default(),
            seeded: Vec::new(),
            sqlite: false,
            failing_handlers: false,
        }
    }

    pub fn with_tenant(mut self, tenant_id: &str, auth_id: &str) -> Self {
        self.tenant_id = tenant_id.to_string();
        self.auth_id = auth_id.to_string();
        self
    }

    /// Bot identity reported by the mock transport.
    pub fn with_own_id(mut self, own_id: &str) -> Self {
        self.own_id = Some(own_id.to_string());
        self
    }

    pub fn with_security(mut self, security: MockSecurity) -> Self {
        self.security = security;
        self
    }

    pub fn with_interpreter(mut self, interpreter: RecordingInterpreter) -> Self {
        self.interpreter = interpreter;
        self
    }

    pub fn with_tiers(mut self, tiers: Arc<dyn TierSource>) -> Self {
        self.tiers = Some(tiers);
        self
    }

    pub fn with_settings(mut self, settings: DispatchSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Store a setting row for the tenant before the first dispatch.
    pub fn with_stored_setting(mut self, key: SettingKey, value: &str) -> Self {
        self.seeded.push((key, value.to_string()));
        self
    }

    /// Back the dispatcher with a temp SQLite store instead of the mock.
    pub fn with_sqlite(mut self) -> Self {
        self.sqlite = true;
        self
    }

    /// Every category handler fails after recording the call.
    pub fn with_failing_handlers(mut self) -> Self {
        self.failing_handlers = true;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, HeraldError> {
        let tenant_id = TenantId::new(self.tenant_id);
        let mock_store = Arc::new(MockSettingsStore::new());

        let (store, temp_dir): (Arc<dyn TenantSettingsStore>, Option<tempfile::TempDir>) =
            if self.sqlite {
                let temp_dir = tempfile::TempDir::new().map_err(HeraldError::store)?;
                let config = StorageConfig {
                    database_path: temp_dir.path().join("test.db").to_string_lossy().to_string(),
                    wal_mode: true,
                };
                let sqlite = SqliteSettingsStore::open(&config).await?;
                (Arc::new(sqlite), Some(temp_dir))
            } else {
                (Arc::clone(&mock_store) as Arc<dyn TenantSettingsStore>, None)
            };
        for (key, value) in &self.seeded {
            store.upsert_setting(&tenant_id, *key, value).await?;
        }

        let transport = Arc::new(match self.own_id {
            Some(own_id) => MockTransport::new().with_own_id(own_id),
            None => MockTransport::new(),
        });
        let session = TenantSession::new(
            tenant_id,
            AuthId::new(self.auth_id),
            Arc::clone(&transport) as Arc<dyn herald_core::Transport>,
        );

        let handler = |name: &str| {
            Arc::new(if self.failing_handlers {
                RecordingHandler::failing(name)
            } else {
                RecordingHandler::new(name)
            })
        };
        let poll_vote = handler("poll_vote");
        let media = handler("media");
        let pending_reply = handler("pending_reply");
        let delete_notice = handler("delete_notice");

        let security = Arc::new(self.security);
        let interpreter = Arc::new(self.interpreter);
        let metrics = Arc::new(RecordingMetrics::new());

        let mut builder = Dispatcher::builder(
            Arc::clone(&store),
            Arc::clone(&security) as _,
            Arc::clone(&interpreter) as _,
        )
        .settings(self.settings)
        .handlers(Handlers {
            poll_vote: Arc::clone(&poll_vote) as _,
            media: Arc::clone(&media) as _,
            pending_reply: Arc::clone(&pending_reply) as _,
            delete_notice: Arc::clone(&delete_notice) as _,
        })
        .metrics(Arc::clone(&metrics) as _);
        if let Some(tiers) = self.tiers {
            builder = builder.tiers(tiers);
        }

        Ok(TestHarness {
            dispatcher: Arc::new(builder.build()),
            session,
            transport,
            store,
            mock_store,
            security,
            interpreter,
            metrics,
            poll_vote,
            media,
            pending_reply,
            delete_notice,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete single-tenant dispatch environment.
pub struct TestHarness {
    pub dispatcher: Arc<Dispatcher>,
    pub session: TenantSession,
    pub transport: Arc<MockTransport>,
    /// The store the dispatcher reads; the mock unless built `with_sqlite()`.
    pub store: Arc<dyn TenantSettingsStore>,
    pub mock_store: Arc<MockSettingsStore>,
    pub security: Arc<MockSecurity>,
    pub interpreter: Arc<RecordingInterpreter>,
    pub metrics: Arc<RecordingMetrics>,
    pub poll_vote: Arc<RecordingHandler>,
    pub media: Arc<RecordingHandler>,
    pub pending_reply: Arc<RecordingHandler>,
    pub delete_notice: Arc<RecordingHandler>,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: Option<tempfile::TempDir>,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Harness with every default.
    pub async fn new() -> Result<Self, HeraldError> {
        Self::builder().build().await
    }

    pub fn tenant_id(&self) -> &TenantId {
        &self.session.tenant_id
    }

    /// Admit and route one event through the full pipeline.
    pub async fn dispatch(&self, event: InboundEvent) -> DispatchReport {
        self.dispatcher.dispatch(&self.session, event).await
    }

    /// Total handler invocations across every category handler.
    pub fn handler_calls(&self) -> usize {
        self.poll_vote.call_count()
            + self.media.call_count()
            + self.pending_reply.call_count()
            + self.delete_notice.call_count()
    }
}
