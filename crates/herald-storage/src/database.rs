// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use std::path::Path;
use std::time::Duration;

use herald_core::HeraldError;
use tokio_rusqlite::Connection;
use tracing::debug;

use crate::migrations;

/// Handle to the single SQLite connection.
#[derive(Clone)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens (creating if needed) the database at `path` and runs migrations.
    pub async fn open(path: impl AsRef<Path>, wal_mode: bool) -> Result<Self, HeraldError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(HeraldError::store)?;
        }
        let conn = Connection::open(path)
            .await
            .map_err(|e| HeraldError::store(format!("sqlite open: {e}")))?;
        let db = Self { conn };
        db.configure(wal_mode).await?;
        debug!(path = %path.display(), wal_mode, "database opened");
        Ok(db)
    }

    /// Opens a private in-memory database with the full schema.
    pub async fn open_in_memory() -> Result<Self, HeraldError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| HeraldError::store(format!("sqlite open: {e}")))?;
        let db = Self { conn };
        db.configure(false).await?;
        Ok(db)
    }

    async fn configure(&self, wal_mode: bool) -> Result<(), HeraldError> {
        self.conn
            .call(move |conn| -> Result<(), rusqlite::Error> {
                if wal_mode {
                    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                        row.get::<_, String>(0)
                    })?;
                }
                conn.pragma_update(None, "synchronous", "NORMAL")?;
                conn.busy_timeout(Duration::from_secs(5))?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;

        self.conn
            .call(migrations::run_migrations)
            .await
            .map_err(|e: tokio_rusqlite::Error<refinery::Error>| {
                HeraldError::store(format!("migration failed: {e}"))
            })
    }

    /// Returns the shared connection handle.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Checkpoints the WAL so the main database file is self-contained.
    pub async fn checkpoint(&self) -> Result<(), HeraldError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}

/// Converts a tokio-rusqlite failure into a transient store error.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> HeraldError {
    HeraldError::store(format!("sqlite: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_schema() {
        let db = Database::open_in_memory().await.unwrap();
        let tables = db
            .connection()
            .call(|conn| -> Result<Vec<String>, rusqlite::Error> {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
                )?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .unwrap();
        assert!(tables.contains(&"tenant_settings".to_string()));
        assert!(tables.contains(&"tenants".to_string()));
    }

    #[tokio::test]
    async fn open_creates_parent_directories_and_enables_wal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("herald.db");
        let db = Database::open(&path, true).await.unwrap();
        assert!(path.exists());

        let mode = db
            .connection()
            .call(|conn| -> Result<String, rusqlite::Error> {
                conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))
            })
            .await
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
        db.checkpoint().await.unwrap();
    }

    #[tokio::test]
    async fn reopening_does_not_rerun_migrations() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("herald.db");
        drop(Database::open(&path, true).await.unwrap());
        assert!(Database::open(&path, true).await.is_ok());
    }
}
