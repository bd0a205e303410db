// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prometheus metrics sink for the Herald dispatch core.
//!
//! Uses the metrics-rs facade with the Prometheus exporter. Metrics are
//! rendered as Prometheus text format via [`PrometheusSink::render`].

pub mod recording;

use async_trait::async_trait;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use herald_core::{
    AdapterType, AuthId, HealthStatus, HeraldError, MetricsSink, PluginAdapter, ProcessingSample,
    TenantId,
};

pub use recording::{
    record_dispatch_duration, record_event, record_failure, record_security_block,
    register_metrics,
};

/// Prometheus-backed [`MetricsSink`].
///
/// Records through the global metrics facade and keeps a handle for
/// rendering.
pub struct PrometheusSink {
    handle: PrometheusHandle,
}

impl PrometheusSink {
    /// Installs the Prometheus recorder globally.
    ///
    /// Only one recorder can be installed per process. Returns an error if a
    /// recorder is already installed.
    pub fn install() -> Result<Self, HeraldError> {
        let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
            HeraldError::Internal(format!("failed to install Prometheus recorder: {e}"))
        })?;

        register_metrics();
        tracing::info!("prometheus metrics recorder installed");

        Ok(Self { handle })
    }

    /// Wraps a handle whose recorder was installed elsewhere.
    pub fn from_handle(handle: PrometheusHandle) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> &PrometheusHandle {
        &self.handle
    }

    /// Render all collected metrics in Prometheus text format.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

impl MetricsSink for PrometheusSink {
    fn record(&self, tenant: &TenantId, _auth: &AuthId, sample: ProcessingSample) {
        record_dispatch_duration(tenant.as_str(), sample.processing_time_ms());
    }

    fn event_routed(&self, category: &str) {
        record_event(category);
    }

    fn stage_failed(&self, stage: &str) {
        record_failure(stage);
    }

    fn security_blocked(&self, _tenant: &TenantId) {
        record_security_block();
    }
}

#[async_trait]
impl PluginAdapter for PrometheusSink {
    fn name(&self) -> &str {
        "prometheus"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Metrics
    }

    async fn health_check(&self) -> Result<HealthStatus, HeraldError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), HeraldError> {
        Ok(())
    }
}
