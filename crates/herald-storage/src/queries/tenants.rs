// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tenant registry: implicit creation and last-activity tracking.

use chrono::Utc;
use herald_core::HeraldError;
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};

/// A row of the `tenants` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantRecord {
    pub tenant_id: String,
    pub auth_id: String,
    pub first_seen_at: String,
    pub last_active_at: String,
}

/// Creates the tenant if unseen, otherwise refreshes `last_active_at` and `auth_id`.
///
/// Returns `true` when the row was created by this call.
pub async fn touch_tenant(db: &Database, tenant_id: &str, auth_id: &str) -> Result<bool, HeraldError> {
    let tenant_id = tenant_id.to_string();
    let auth_id = auth_id.to_string();
    let now = Utc::now().to_rfc3339();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let tx = conn.transaction()?;
            let created = tx.execute(
                "INSERT OR IGNORE INTO tenants (tenant_id, auth_id, first_seen_at, last_active_at)
                 VALUES (?1, ?2, ?3, ?3)",
                params![tenant_id, auth_id, now],
            )? == 1;
            if !created {
                tx.execute(
                    "UPDATE tenants SET auth_id = ?2, last_active_at = ?3 WHERE tenant_id = ?1",
                    params![tenant_id, auth_id, now],
                )?;
            }
            tx.commit()?;
            Ok(created)
        })
        .await
        .map_err(map_tr_err)
}

/// Fetches one tenant.
pub async fn get_tenant(db: &Database, tenant_id: &str) -> Result<Option<TenantRecord>, HeraldError> {
    let tenant_id = tenant_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT tenant_id, auth_id, first_seen_at, last_active_at
                 FROM tenants WHERE tenant_id = ?1",
                params![tenant_id],
                |row| {
                    Ok(TenantRecord {
                        tenant_id: row.get(0)?,
                        auth_id: row.get(1)?,
                        first_seen_at: row.get(2)?,
                        last_active_at: row.get(3)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}
