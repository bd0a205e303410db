// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory tenant settings store with failure injection and call counting.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use herald_core::{
    AdapterType, AuthId, HealthStatus, HeraldError, PluginAdapter, SettingKey, TenantId,
    TenantSettingsStore,
};

/// A mock settings store for testing.
///
/// `set_failing(true)` makes every call return a transient store error.
#[derive(Debug, Default)]
pub struct MockSettingsStore {
    settings: Mutex<HashMap<(TenantId, SettingKey), String>>,
    tenants: Mutex<HashSet<TenantId>>,
    failing: AtomicBool,
    get_calls: AtomicUsize,
    upsert_calls: AtomicUsize,
}

impl MockSettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a stored setting.
    pub fn with_setting(self, tenant: &str, key: SettingKey, value: &str) -> Self {
        self.put(tenant, key, value);
        self
    }

    /// Write a row directly, bypassing failure injection and counters.
    pub fn put(&self, tenant: &str, key: SettingKey, value: &str) {
        if let Ok(mut settings) = self.settings.lock() {
            settings.insert((TenantId::new(tenant), key), value.to_string());
        }
    }

    pub fn value(&self, tenant: &str, key: SettingKey) -> Option<String> {
        self.settings
            .lock()
            .ok()
            .and_then(|s| s.get(&(TenantId::new(tenant), key)).cloned())
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of `get_setting` calls, successful or not.
    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }

    pub fn knows_tenant(&self, tenant: &str) -> bool {
        self.tenants
            .lock()
            .map(|t| t.contains(&TenantId::new(tenant)))
            .unwrap_or(false)
    }

    fn check_failing(&self) -> Result<(), HeraldError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(HeraldError::store(std::io::Error::other(
                "mock store unavailable",
            )));
        }
        Ok(())
    }

    fn poisoned() -> HeraldError {
        HeraldError::Internal("mock store lock poisoned".to_string())
    }
}

#[async_trait]
impl PluginAdapter for MockSettingsStore {
    fn name(&self) -> &str {
        "mock-store"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Store
    }

    async fn health_check(&self) -> Result<HealthStatus, HeraldError> {
        if self.failing.load(Ordering::SeqCst) {
            return Ok(HealthStatus::Unhealthy("failure injected".to_string()));
        }
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), HeraldError> {
        Ok(())
    }
}

#[async_trait]
impl TenantSettingsStore for MockSettingsStore {
    async fn get_setting(
        &self,
        tenant: &TenantId,
        key: SettingKey,
    ) -> Result<Option<String>, HeraldError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failing()?;
        let settings = self.settings.lock().map_err(|_| Self::poisoned())?;
        Ok(settings.get(&(tenant.clone(), key)).cloned())
    }

    async fn upsert_setting(
        &self,
        tenant: &TenantId,
        key: SettingKey,
        value: &str,
    ) -> Result<(), HeraldError> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failing()?;
        let mut settings = self.settings.lock().map_err(|_| Self::poisoned())?;
        settings.insert((tenant.clone(), key), value.to_string());
        Ok(())
    }

    async fn touch_tenant(&self, tenant: &TenantId, _auth: &AuthId) -> Result<bool, HeraldError> {
        self.check_failing()?;
        let mut tenants = self.tenants.lock().map_err(|_| Self::poisoned())?;
        Ok(tenants.insert(tenant.clone()))
    }
}
