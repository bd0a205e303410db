// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Time-boxed cache of per-tenant settings in front of the durable store.
//!
//! A read is a hit iff the entry is younger than the TTL. Expired entries are
//! never evicted actively; the next miss replaces them. Concurrent misses for
//! the same tenant are not deduplicated: each fetches, and the results
//! converge because the fetch is idempotent.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use herald_core::{
    CommandPrefix, FeatureFlags, HeraldError, OperatingMode, SettingValue, TenantId,
    TenantSettingsStore,
};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::settings::DispatchSettings;

/// Why a default value was served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultCause {
    /// The store has no row for this tenant and key.
    NotFound,
    /// The stored value could not be decoded.
    Invalid(String),
    /// The store failed and no previous value was cached.
    StoreUnavailable(String),
}

/// How a cached setting was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved<V> {
    /// Fresh cache hit.
    Cached(V),
    /// Miss, loaded from the store.
    Fetched(V),
    /// The store failed; an expired entry was served instead.
    Stale { value: V, error: String },
    /// The documented default.
    Defaulted { value: V, cause: DefaultCause },
}

impl<V> Resolved<V> {
    pub fn value(&self) -> &V {
        match self {
            Resolved::Cached(v) | Resolved::Fetched(v) => v,
            Resolved::Stale { value, .. } | Resolved::Defaulted { value, .. } => value,
        }
    }

    pub fn into_value(self) -> V {
        match self {
            Resolved::Cached(v) | Resolved::Fetched(v) => v,
            Resolved::Stale { value, .. } | Resolved::Defaulted { value, .. } => value,
        }
    }

    /// Whether the value came from a failed or empty store lookup.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Resolved::Stale { .. } | Resolved::Defaulted { .. })
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    fetched_at: Instant,
}

/// Cache of one setting type for every tenant.
pub struct ConfigCache<V: SettingValue> {
    store: Arc<dyn TenantSettingsStore>,
    ttl: Duration,
    default: V,
    entries: DashMap<TenantId, CacheEntry<V>>,
}

impl<V: SettingValue> ConfigCache<V> {
    pub fn new(store: Arc<dyn TenantSettingsStore>, ttl: Duration, default: V) -> Self {
        Self {
            store,
            ttl,
            default,
            entries: DashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn default_value(&self) -> &V {
        &self.default
    }

    /// Serves the cached value if fresh, otherwise fetches and caches.
    ///
    /// Never fails. A missing or undecodable row caches the default. A store
    /// error serves the expired entry if there is one, else the default, and
    /// caches nothing.
    pub async fn get(&self, tenant: &TenantId) -> Resolved<V> {
        let stale = match self.entries.get(tenant) {
            Some(entry) if entry.fetched_at.elapsed() < self.ttl => {
                return Resolved::Cached(entry.value.clone());
            }
            Some(entry) => Some(entry.value.clone()),
            None => None,
        };

        match self.store.get_setting(tenant, V::KEY).await {
            Ok(Some(raw)) => match V::decode(&raw) {
                Ok(value) => {
                    self.put(tenant, value.clone());
                    debug!(tenant_id = %tenant, key = %V::KEY, "setting fetched");
                    Resolved::Fetched(value)
                }
                Err(e) => {
                    warn!(tenant_id = %tenant, key = %V::KEY, error = %e, "stored setting invalid, using default");
                    self.put(tenant, self.default.clone());
                    Resolved::Defaulted {
                        value: self.default.clone(),
                        cause: DefaultCause::Invalid(e.to_string()),
                    }
                }
            },
            Ok(None) => {
                self.put(tenant, self.default.clone());
                Resolved::Defaulted {
                    value: self.default.clone(),
                    cause: DefaultCause::NotFound,
                }
            }
            Err(e) => {
                warn!(tenant_id = %tenant, key = %V::KEY, error = %e, "settings store unavailable");
                match stale {
                    Some(value) => Resolved::Stale {
                        value,
                        error: e.to_string(),
                    },
                    None => Resolved::Defaulted {
                        value: self.default.clone(),
                        cause: DefaultCause::StoreUnavailable(e.to_string()),
                    },
                }
            }
        }
    }

    /// Drops the tenant's entry so the next `get` goes to the store.
    pub fn invalidate(&self, tenant: &TenantId) {
        self.entries.remove(tenant);
    }

    /// Write-through: persists, then refreshes the entry.
    ///
    /// On a store error nothing is cached and the error is returned.
    pub async fn set(&self, tenant: &TenantId, value: V) -> Result<(), HeraldError> {
        self.store
            .upsert_setting(tenant, V::KEY, &value.encode())
            .await?;
        self.put(tenant, value);
        debug!(tenant_id = %tenant, key = %V::KEY, "setting written through");
        Ok(())
    }

    fn put(&self, tenant: &TenantId, value: V) {
        self.entries.insert(
            tenant.clone(),
            CacheEntry {
                value,
                fetched_at: Instant::now(),
            },
        );
    }
}

impl<V: SettingValue + std::fmt::Debug> std::fmt::Debug for ConfigCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigCache")
            .field("key", &V::KEY)
            .field("ttl", &self.ttl)
            .field("default", &self.default)
            .field("entries", &self.entries.len())
            .finish()
    }
}

/// The three tenant setting caches the dispatch path reads.
///
/// Shared between the dispatcher and anything that writes settings, so a
/// write through one handle is visible to reads through the other.
#[derive(Debug, Clone)]
pub struct SettingsCaches {
    pub prefix: Arc<ConfigCache<CommandPrefix>>,
    pub mode: Arc<ConfigCache<OperatingMode>>,
    pub features: Arc<ConfigCache<FeatureFlags>>,
}

impl SettingsCaches {
    pub fn new(store: Arc<dyn TenantSettingsStore>, settings: &DispatchSettings) -> Self {
        Self {
            prefix: Arc::new(ConfigCache::new(
                Arc::clone(&store),
                settings.prefix_ttl,
                settings.default_prefix.clone(),
            )),
            mode: Arc::new(ConfigCache::new(
                Arc::clone(&store),
                settings.mode_ttl,
                OperatingMode::default(),
            )),
            features: Arc::new(ConfigCache::new(
                store,
                settings.features_ttl,
                FeatureFlags::default(),
            )),
        }
    }
}
