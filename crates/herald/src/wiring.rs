// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Assembly of the dispatcher from configuration, shared by `serve` and `replay`.

use std::sync::Arc;

use herald_config::{HeraldConfig, TenantConfig};
use herald_core::{AuthId, HeraldError, MetricsSink, TenantId, TenantSettingsStore};
use herald_dispatch::{DispatchSettings, Dispatcher, FixedTier, NoopMetrics, SettingsCaches};
use tracing::{debug, info};

use crate::commands::SettingsInterpreter;
use crate::gate::BlocklistGate;

/// Metrics sink selected by `[metrics]`, plus the Prometheus handle when installed.
pub struct MetricsSetup {
    pub sink: Arc<dyn MetricsSink>,
    #[cfg(feature = "prometheus")]
    pub prometheus: Option<Arc<herald_prometheus::PrometheusSink>>,
}

impl MetricsSetup {
    pub fn noop() -> Self {
        Self {
            sink: Arc::new(NoopMetrics),
            #[cfg(feature = "prometheus")]
            prometheus: None,
        }
    }

    /// Installs the global Prometheus recorder when metrics are enabled.
    pub fn from_config(config: &HeraldConfig) -> Result<Self, HeraldError> {
        if !config.metrics.enabled {
            return Ok(Self::noop());
        }
        #[cfg(feature = "prometheus")]
        {
            let sink = Arc::new(herald_prometheus::PrometheusSink::install()?);
            Ok(Self {
                sink: sink.clone(),
                prometheus: Some(sink),
            })
        }
        #[cfg(not(feature = "prometheus"))]
        {
            tracing::warn!("metrics enabled but herald was built without the prometheus feature");
            Ok(Self::noop())
        }
    }

    /// Prometheus text exposition, if a recorder is installed.
    pub fn render(&self) -> Option<String> {
        #[cfg(feature = "prometheus")]
        {
            self.prometheus.as_ref().map(|sink| sink.render())
        }
        #[cfg(not(feature = "prometheus"))]
        {
            None
        }
    }
}

/// Builds a dispatcher with the built-in blocklist gate and settings interpreter.
///
/// The interpreter writes through the same caches the dispatcher reads.
pub fn build_dispatcher(
    config: &HeraldConfig,
    store: Arc<dyn TenantSettingsStore>,
    metrics: Arc<dyn MetricsSink>,
) -> Result<Dispatcher, HeraldError> {
    let settings = DispatchSettings::try_from(&config.dispatch)?;
    let caches = SettingsCaches::new(Arc::clone(&store), &settings);
    let gate = BlocklistGate::new(&config.security.blocked_senders);
    if gate.is_empty() {
        debug!("security blocklist is empty");
    }
    info!(
        blocked_senders = gate.len(),
        default_prefix = %settings.default_prefix,
        "dispatcher configured"
    );

    Ok(Dispatcher::builder(
        store,
        Arc::new(gate),
        Arc::new(SettingsInterpreter::new(caches.clone())),
    )
    .settings(settings)
    .caches(caches)
    .tiers(Arc::new(FixedTier::default()))
    .metrics(metrics)
    .build())
}

/// Picks the tenant to serve: the one named by `--tenant`, else the first configured.
pub fn select_tenant(
    config: &HeraldConfig,
    requested: Option<&str>,
) -> Result<(TenantId, AuthId), HeraldError> {
    let found: Option<&TenantConfig> = match requested {
        Some(id) => config.tenants.iter().find(|t| t.tenant_id == id),
        None => config.tenants.first(),
    };
    match (found, requested) {
        (Some(tenant), _) => Ok((
            TenantId::new(tenant.tenant_id.clone()),
            AuthId::new(tenant.auth_id.clone()),
        )),
        (None, Some(id)) => Err(HeraldError::Config(format!(
            "tenant `{id}` is not listed under [[tenants]]"
        ))),
        (None, None) => Err(HeraldError::Config(
            "no tenant configured; add a [[tenants]] entry".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_core::{CommandPrefix, SettingKey};
    use herald_dispatch::DispatchOutcome;
    use herald_test_utils::{EventBuilder, MockSettingsStore, MockTransport};

    fn config_with_tenants(toml: &str) -> HeraldConfig {
        herald_config::load_and_validate_str(toml).unwrap()
    }

    #[test]
    fn select_tenant_defaults_to_first() {
        let config = config_with_tenants(
            r#"
[[tenants]]
tenant_id = "5511"
auth_id = "a1"

[[tenants]]
tenant_id = "5522"
auth_id = "a2"
"#,
        );
        let (tenant, auth) = select_tenant(&config, None).unwrap();
        assert_eq!(tenant.as_str(), "5511");
        assert_eq!(auth.as_str(), "a1");

        let (tenant, _) = select_tenant(&config, Some("5522")).unwrap();
        assert_eq!(tenant.as_str(), "5522");

        let err = select_tenant(&config, Some("5533")).unwrap_err();
        assert!(err.to_string().contains("5533"));
    }

    #[test]
    fn select_tenant_requires_one() {
        let err = select_tenant(&HeraldConfig::default(), None).unwrap_err();
        assert_eq!(err.kind(), "config");
    }

    #[tokio::test]
    async fn built_dispatcher_blocks_configured_senders() {
        let config = config_with_tenants(
            r#"
[security]
blocked_senders = ["5599"]
"#,
        );
        let store = Arc::new(MockSettingsStore::new());
        let dispatcher =
            build_dispatcher(&config, store, Arc::new(NoopMetrics)).unwrap();
        let session = herald_core::TenantSession::new(
            TenantId::new("551199999"),
            AuthId::new("a1"),
            Arc::new(MockTransport::new()),
        );

        let blocked = EventBuilder::new("E1").direct("5599").text("hi").build();
        let report = dispatcher.dispatch(&session, blocked).await;
        assert!(matches!(report.outcome, DispatchOutcome::Blocked { .. }));

        let allowed = EventBuilder::new("E2").direct("5588").text("hi").build();
        let report = dispatcher.dispatch(&session, allowed).await;
        assert!(report.outcome.is_routed());
    }

    #[tokio::test]
    async fn settings_commands_take_effect_on_next_event() {
        let config = HeraldConfig::default();
        let store = Arc::new(MockSettingsStore::new());
        let dispatcher =
            build_dispatcher(&config, store.clone(), Arc::new(NoopMetrics)).unwrap();
        let transport = Arc::new(MockTransport::new());
        let session = herald_core::TenantSession::new(
            TenantId::new("551199999"),
            AuthId::new("a1"),
            transport.clone(),
        );

        let set = EventBuilder::new("E1").direct("5511").from_me().text(".setprefix !").build();
        let report = dispatcher.dispatch(&session, set).await;
        assert_eq!(
            report.outcome,
            DispatchOutcome::Routed {
                category: herald_router::Category::PlainMessage,
                command: true
            }
        );
        assert_eq!(store.value("551199999", SettingKey::Prefix).as_deref(), Some("!"));

        let ping = EventBuilder::new("E2").direct("5511").from_me().text("!ping").build();
        dispatcher.dispatch(&session, ping).await;
        let reactions = transport.reactions().await;
        assert_eq!(reactions.last().map(|r| r.emoji.as_str()), Some(crate::commands::PONG));

        let tenant = TenantId::new("551199999");
        assert_eq!(
            dispatcher.caches().prefix.get(&tenant).await.into_value(),
            CommandPrefix::new("!").unwrap()
        );
    }
}
