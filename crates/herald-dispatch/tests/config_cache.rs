// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! ConfigCache freshness, fallback and write-through behavior.

use std::sync::Arc;
use std::time::Duration;

use herald_core::{CommandPrefix, OperatingMode, SettingKey, TenantId};
use herald_dispatch::{ConfigCache, DefaultCause, Resolved};
use herald_test_utils::MockSettingsStore;

const TTL: Duration = Duration::from_secs(600);

fn mode_cache(store: &Arc<MockSettingsStore>) -> ConfigCache<OperatingMode> {
    ConfigCache::new(Arc::clone(store) as _, TTL, OperatingMode::SelfOnly)
}

fn tenant() -> TenantId {
    TenantId::new("551199999")
}

#[tokio::test(start_paused = true)]
async fn set_then_get_reads_own_write() {
    let store = Arc::new(MockSettingsStore::new());
    let cache = mode_cache(&store);

    cache
        .set(&tenant(), OperatingMode::AdminAssisted)
        .await
        .unwrap();

    assert_eq!(
        cache.get(&tenant()).await,
        Resolved::Cached(OperatingMode::AdminAssisted)
    );
    assert_eq!(store.get_calls(), 0);
    assert_eq!(
        store.value("551199999", SettingKey::Mode).as_deref(),
        Some("admin-assisted")
    );
}

#[tokio::test(start_paused = true)]
async fn not_found_defaults_and_caches_default() {
    let store = Arc::new(MockSettingsStore::new());
    let cache = mode_cache(&store);

    assert_eq!(
        cache.get(&tenant()).await,
        Resolved::Defaulted {
            value: OperatingMode::SelfOnly,
            cause: DefaultCause::NotFound,
        }
    );
    assert_eq!(
        cache.get(&tenant()).await,
        Resolved::Cached(OperatingMode::SelfOnly)
    );
    assert_eq!(store.get_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn entry_expires_after_ttl() {
    let store = Arc::new(MockSettingsStore::new().with_setting(
        "551199999",
        SettingKey::Mode,
        "me",
    ));
    let cache = mode_cache(&store);

    assert_eq!(
        cache.get(&tenant()).await,
        Resolved::Fetched(OperatingMode::SelfOnly)
    );

    store.put("551199999", SettingKey::Mode, "admin");
    tokio::time::advance(TTL - Duration::from_secs(1)).await;
    assert_eq!(
        cache.get(&tenant()).await,
        Resolved::Cached(OperatingMode::SelfOnly)
    );

    tokio::time::advance(Duration::from_secs(1)).await;
    assert_eq!(
        cache.get(&tenant()).await,
        Resolved::Fetched(OperatingMode::AdminAssisted)
    );
    assert_eq!(store.get_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn store_failure_without_entry_serves_default_uncached() {
    let store = Arc::new(MockSettingsStore::new());
    store.set_failing(true);
    let cache = mode_cache(&store);

    let resolved = cache.get(&tenant()).await;
    assert!(matches!(
        resolved,
        Resolved::Defaulted {
            value: OperatingMode::SelfOnly,
            cause: DefaultCause::StoreUnavailable(_),
        }
    ));
    assert!(resolved.is_fallback());

    // Nothing was cached, so the next read goes back to the store.
    store.set_failing(false);
    store.put("551199999", SettingKey::Mode, "admin");
    assert_eq!(
        cache.get(&tenant()).await,
        Resolved::Fetched(OperatingMode::AdminAssisted)
    );
}

#[tokio::test(start_paused = true)]
async fn store_failure_after_expiry_serves_stale_value() {
    let store = Arc::new(MockSettingsStore::new().with_setting(
        "551199999",
        SettingKey::Mode,
        "admin",
    ));
    let cache = mode_cache(&store);
    cache.get(&tenant()).await;

    tokio::time::advance(TTL).await;
    store.set_failing(true);

    match cache.get(&tenant()).await {
        Resolved::Stale { value, .. } => assert_eq!(value, OperatingMode::AdminAssisted),
        other => panic!("expected stale value, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn undecodable_value_defaults_with_cause() {
    let store = Arc::new(MockSettingsStore::new().with_setting(
        "551199999",
        SettingKey::Mode,
        "everyone",
    ));
    let cache = mode_cache(&store);

    match cache.get(&tenant()).await {
        Resolved::Defaulted {
            value,
            cause: DefaultCause::Invalid(message),
        } => {
            assert_eq!(value, OperatingMode::SelfOnly);
            assert!(message.contains("everyone"));
        }
        other => panic!("expected invalid default, got {other:?}"),
    }
    assert!(matches!(cache.get(&tenant()).await, Resolved::Cached(_)));
}

#[tokio::test(start_paused = true)]
async fn failed_set_keeps_previous_value() {
    let store = Arc::new(MockSettingsStore::new());
    let cache: ConfigCache<CommandPrefix> =
        ConfigCache::new(Arc::clone(&store) as _, TTL, CommandPrefix::default());
    cache
        .set(&tenant(), CommandPrefix::new("!").unwrap())
        .await
        .unwrap();

    store.set_failing(true);
    let err = cache
        .set(&tenant(), CommandPrefix::new("#").unwrap())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "transient_store");

    assert_eq!(cache.get(&tenant()).await.value().as_str(), "!");
}

#[tokio::test(start_paused = true)]
async fn invalidate_forces_refetch() {
    let store = Arc::new(MockSettingsStore::new());
    let cache = mode_cache(&store);
    cache.get(&tenant()).await;

    store.put("551199999", SettingKey::Mode, "admin");
    cache.invalidate(&tenant());

    assert_eq!(
        cache.get(&tenant()).await,
        Resolved::Fetched(OperatingMode::AdminAssisted)
    );
}

#[tokio::test(start_paused = true)]
async fn tenants_are_cached_independently() {
    let store = Arc::new(MockSettingsStore::new().with_setting(
        "other",
        SettingKey::Mode,
        "admin",
    ));
    let cache = mode_cache(&store);

    assert_eq!(
        cache.get(&TenantId::new("other")).await.into_value(),
        OperatingMode::AdminAssisted
    );
    assert_eq!(
        cache.get(&tenant()).await.into_value(),
        OperatingMode::SelfOnly
    );
}
