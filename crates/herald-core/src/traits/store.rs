// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable store boundary for tenant settings.

use async_trait::async_trait;

use crate::error::HeraldError;
use crate::settings::SettingKey;
use crate::traits::adapter::PluginAdapter;
use crate::types::{AuthId, TenantId};

/// Persistent per-tenant key/value settings.
///
/// Any method may fail with [`HeraldError::TransientStore`]; callers degrade
/// rather than propagate.
#[async_trait]
pub trait TenantSettingsStore: PluginAdapter {
    /// Reads one setting. `Ok(None)` means the row does not exist.
    async fn get_setting(
        &self,
        tenant: &TenantId,
        key: SettingKey,
    ) -> Result<Option<String>, HeraldError>;

    /// Inserts or replaces one setting, stamping `updated_at`.
    async fn upsert_setting(
        &self,
        tenant: &TenantId,
        key: SettingKey,
        value: &str,
    ) -> Result<(), HeraldError>;

    /// Records activity for a tenant, creating it on first sight.
    ///
    /// Returns `true` when the tenant was created by this call.
    async fn touch_tenant(&self, tenant: &TenantId, auth: &AuthId) -> Result<bool, HeraldError>;
}
