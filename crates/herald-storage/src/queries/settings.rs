// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tenant settings key/value operations.

use chrono::Utc;
use herald_core::HeraldError;
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};

/// Reads one setting value, `None` when the row does not exist.
pub async fn get_setting(
    db: &Database,
    tenant_id: &str,
    key: &str,
) -> Result<Option<String>, HeraldError> {
    let tenant_id = tenant_id.to_string();
    let key = key.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT value FROM tenant_settings WHERE tenant_id = ?1 AND key = ?2",
                params![tenant_id, key],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Inserts or replaces one setting, stamping `updated_at`.
pub async fn upsert_setting(
    db: &Database,
    tenant_id: &str,
    key: &str,
    value: &str,
) -> Result<(), HeraldError> {
    let tenant_id = tenant_id.to_string();
    let key = key.to_string();
    let value = value.to_string();
    let now = Utc::now().to_rfc3339();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO tenant_settings (tenant_id, key, value, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (tenant_id, key)
                 DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![tenant_id, key, value, now],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Lists every `(key, value, updated_at)` row of a tenant, ordered by key.
pub async fn list_settings(
    db: &Database,
    tenant_id: &str,
) -> Result<Vec<(String, String, String)>, HeraldError> {
    let tenant_id = tenant_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<(String, String, String)>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT key, value, updated_at FROM tenant_settings
                 WHERE tenant_id = ?1 ORDER BY key",
            )?;
            let rows = stmt.query_map(params![tenant_id], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}
