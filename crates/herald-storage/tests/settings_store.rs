// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durability of tenant settings across database reopen.

use herald_config::model::StorageConfig;
use herald_core::{AuthId, SettingKey, TenantId, TenantSettingsStore};
use herald_storage::SqliteSettingsStore;
use herald_storage::queries::tenants::get_tenant;
use tempfile::tempdir;

#[tokio::test]
async fn settings_survive_reopen() {
    let dir = tempdir().unwrap();
    let config = StorageConfig {
        database_path: dir.path().join("herald.db").display().to_string(),
        wal_mode: true,
    };
    let tenant = TenantId::new("551199999");

    {
        let store = SqliteSettingsStore::open(&config).await.unwrap();
        store
            .upsert_setting(&tenant, SettingKey::Prefix, "!")
            .await
            .unwrap();
        assert!(
            store
                .touch_tenant(&tenant, &AuthId::new("owner"))
                .await
                .unwrap()
        );
        store.database().checkpoint().await.unwrap();
    }

    let store = SqliteSettingsStore::open(&config).await.unwrap();
    assert_eq!(
        store
            .get_setting(&tenant, SettingKey::Prefix)
            .await
            .unwrap()
            .as_deref(),
        Some("!")
    );
    assert!(
        !store
            .touch_tenant(&tenant, &AuthId::new("owner"))
            .await
            .unwrap()
    );
    let record = get_tenant(store.database(), tenant.as_str())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.auth_id, "owner");
}
