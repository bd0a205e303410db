// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `herald serve`: dispatch NDJSON events from stdin until EOF or a signal.

use std::path::Path;
use std::sync::Arc;

use herald_config::HeraldConfig;
use herald_core::{HeraldError, PluginAdapter, TenantSession};
use herald_dispatch::{Ingress, install_signal_handler};
use herald_storage::SqliteSettingsStore;
use tracing::{debug, info, warn};

use crate::ndjson::NdjsonTransport;
use crate::wiring::{MetricsSetup, build_dispatcher, select_tenant};

/// Runs the dispatcher for one tenant over stdin/stdout.
///
/// Returns once the input stream ends or SIGTERM/SIGINT arrives, after every
/// in-flight dispatch and pending status batch has completed. Statuses read
/// from `unseen` are viewed at start-up when status viewing is on.
pub async fn run_serve(
    config: HeraldConfig,
    tenant: Option<String>,
    unseen: Option<&Path>,
) -> Result<(), HeraldError> {
    let (tenant_id, auth_id) = select_tenant(&config, tenant.as_deref())?;
    let unseen = match unseen {
        Some(path) => NdjsonTransport::read_file(path).await?,
        None => Vec::new(),
    };

    let store = Arc::new(SqliteSettingsStore::open(&config.storage).await?);
    info!(path = %config.storage.database_path, "settings store opened");

    let metrics = MetricsSetup::from_config(&config)?;
    let dispatcher = Arc::new(build_dispatcher(
        &config,
        store.clone(),
        Arc::clone(&metrics.sink),
    )?);

    // The bot acts through the operator's own account.
    let transport = Arc::new(
        NdjsonTransport::stdio()
            .with_own_id(Some(tenant_id.to_string()))
            .with_unseen_statuses(unseen),
    );
    let session = TenantSession::new(tenant_id.clone(), auth_id, transport.clone());

    let mut ingress = Ingress::new(Arc::clone(&dispatcher));
    ingress.add_session(session);

    info!(
        agent = %config.agent.name,
        tenant_id = %tenant_id,
        "herald serving; reading events from stdin"
    );
    let cancel = install_signal_handler();
    let summary = ingress.run(cancel).await;
    info!(
        received = summary.received,
        admitted = summary.admitted,
        dropped = summary.dropped,
        skipped_lines = transport.skipped(),
        "herald stopped"
    );

    if let Some(rendered) = metrics.render() {
        debug!(metrics = %rendered, "final metrics snapshot");
    }
    if let Err(e) = transport.shutdown().await {
        warn!(error = %e, "transport shutdown failed");
    }
    store.shutdown().await?;
    Ok(())
}
