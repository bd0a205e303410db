// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `herald replay`: run a recorded NDJSON event file through the dispatcher
//! and print one report line per event.

use std::path::Path;
use std::sync::Arc;

use herald_config::HeraldConfig;
use herald_core::{HeraldError, PluginAdapter, TenantSession, TenantSettingsStore, Transport};
use herald_dispatch::{DispatchOutcome, DispatchReport, drain_in_flight};
use herald_storage::{Database, SqliteSettingsStore};
use tracing::info;

use crate::ndjson::NdjsonTransport;
use crate::wiring::{MetricsSetup, build_dispatcher, select_tenant};

/// Counts of a finished replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub events: u64,
    pub routed: u64,
    pub failed: u64,
}

impl ReplaySummary {
    fn observe(&mut self, outcome: &DispatchOutcome) {
        self.events += 1;
        match outcome {
            DispatchOutcome::Routed { .. } => self.routed += 1,
            DispatchOutcome::Failed { .. } | DispatchOutcome::SecurityFailed { .. } => {
                self.failed += 1
            }
            _ => {}
        }
    }
}

fn describe(outcome: &DispatchOutcome) -> String {
    match outcome {
        DispatchOutcome::Dropped { reason } => format!("dropped ({reason})"),
        DispatchOutcome::Blocked { reason } => format!("blocked ({reason})"),
        DispatchOutcome::SecurityFailed { error } => format!("security-failed ({error})"),
        DispatchOutcome::Routed {
            category,
            command: true,
        } => format!("routed {} +command", category.as_str()),
        DispatchOutcome::Routed { category, .. } => format!("routed {}", category.as_str()),
        DispatchOutcome::Ignored { category } => format!("ignored {}", category.as_str()),
        DispatchOutcome::Failed {
            category,
            stage,
            error,
        } => format!("failed {} at {} ({error})", category.as_str(), stage.as_str()),
    }
}

/// One tab-separated line: sequence, event id, outcome, elapsed milliseconds.
pub fn format_report(report: &DispatchReport) -> String {
    format!(
        "{}\t{}\t{}\t{}ms",
        report.seq,
        report.event_id,
        describe(&report.outcome),
        report.elapsed.as_millis()
    )
}

/// Replays `file` for the selected tenant.
///
/// With `in_memory` the configured database is left untouched and settings
/// live only for the duration of the replay.
pub async fn run_replay(
    config: HeraldConfig,
    file: &Path,
    tenant: Option<String>,
    in_memory: bool,
) -> Result<ReplaySummary, HeraldError> {
    let (tenant_id, auth_id) = select_tenant(&config, tenant.as_deref())?;
    let store = if in_memory {
        Arc::new(SqliteSettingsStore::new(Database::open_in_memory().await?))
    } else {
        Arc::new(SqliteSettingsStore::open(&config.storage).await?)
    };

    let transport =
        Arc::new(NdjsonTransport::open(file).await?.with_own_id(Some(tenant_id.to_string())));
    let summary = replay_events(&config, store.clone(), transport, tenant_id, auth_id).await?;
    store.shutdown().await?;
    Ok(summary)
}

async fn replay_events(
    config: &HeraldConfig,
    store: Arc<dyn TenantSettingsStore>,
    transport: Arc<NdjsonTransport>,
    tenant_id: herald_core::TenantId,
    auth_id: herald_core::AuthId,
) -> Result<ReplaySummary, HeraldError> {
    // Replays never install the global recorder.
    let metrics = MetricsSetup::noop();
    let dispatcher = build_dispatcher(config, store, metrics.sink)?;
    let session = TenantSession::new(tenant_id, auth_id, transport.clone());

    let mut summary = ReplaySummary::default();
    while let Some(raw) = transport.next_event().await? {
        let report = dispatcher.dispatch(&session, raw).await;
        println!("{}", format_report(&report));
        summary.observe(&report.outcome);
    }
    drain_in_flight(dispatcher.tasks()).await;

    info!(
        events = summary.events,
        routed = summary.routed,
        failed = summary.failed,
        skipped_lines = transport.skipped(),
        "replay complete"
    );
    Ok(summary)
}
