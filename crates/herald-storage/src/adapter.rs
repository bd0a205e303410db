// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the TenantSettingsStore trait.

use async_trait::async_trait;
use tracing::debug;

use herald_config::model::StorageConfig;
use herald_core::{
    AdapterType, AuthId, HealthStatus, HeraldError, PluginAdapter, SettingKey, TenantId,
    TenantSettingsStore,
};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed tenant settings store.
///
/// Wraps a [`Database`] handle and delegates to the typed query modules.
#[derive(Clone)]
pub struct SqliteSettingsStore {
    db: Database,
}

impl SqliteSettingsStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Opens the database described by `config` and runs migrations.
    pub async fn open(config: &StorageConfig) -> Result<Self, HeraldError> {
        let db = Database::open(&config.database_path, config.wal_mode).await?;
        debug!(path = %config.database_path, "SQLite settings store initialized");
        Ok(Self::new(db))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl PluginAdapter for SqliteSettingsStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Store
    }

    async fn health_check(&self) -> Result<HealthStatus, HeraldError> {
        let result = self
            .db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err);
        Ok(match result {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        })
    }

    async fn shutdown(&self) -> Result<(), HeraldError> {
        self.db.checkpoint().await?;
        debug!("shutdown: WAL checkpoint complete");
        Ok(())
    }
}

#[async_trait]
impl TenantSettingsStore for SqliteSettingsStore {
    async fn get_setting(
        &self,
        tenant: &TenantId,
        key: SettingKey,
    ) -> Result<Option<String>, HeraldError> {
        queries::settings::get_setting(&self.db, tenant.as_str(), &key.to_string()).await
    }

    async fn upsert_setting(
        &self,
        tenant: &TenantId,
        key: SettingKey,
        value: &str,
    ) -> Result<(), HeraldError> {
        queries::settings::upsert_setting(&self.db, tenant.as_str(), &key.to_string(), value)
            .await
    }

    async fn touch_tenant(&self, tenant: &TenantId, auth: &AuthId) -> Result<bool, HeraldError> {
        queries::tenants::touch_tenant(&self.db, tenant.as_str(), auth.as_str()).await
    }
}
