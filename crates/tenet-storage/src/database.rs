// SPDX-FileCopyrightText: 2026 Tenet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! `Database` IS the single writer: clones share one connection, and
//! multi-row mutations run as one rusqlite transaction inside one `call`.
//! Do NOT create additional Connection instances for writes.

use tenet_config::model::StorageConfig;
use tenet_core::TenetError;
use tokio_rusqlite::Connection;
use tracing::debug;

use crate::migrations::run_migrations;

/// Milliseconds SQLite waits on a locked database before returning BUSY.
const BUSY_TIMEOUT_MS: u32 = 5000;

/// Handle to the Tenet SQLite database.
///
/// Cloning is cheap: clones share the same background connection thread.
#[derive(Clone)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database at `path` in WAL mode and run migrations.
    pub async fn open(path: &str) -> Result<Self, TenetError> {
        Self::open_with(path, true).await
    }

    /// Open using the storage section of the configuration.
    pub async fn open_with_config(config: &StorageConfig) -> Result<Self, TenetError> {
        let parent = std::path::Path::new(&config.database_path).parent();
        if let Some(parent) = parent.filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| TenetError::Storage {
                source: Box::new(e),
            })?;
        }
        Self::open_with(&config.database_path, config.wal_mode).await
    }

    /// Open a private in-memory database with the full schema applied.
    pub async fn open_in_memory() -> Result<Self, TenetError> {
        let conn = Connection::open_in_memory().await.map_err(map_open_err)?;
        let db = Self { conn };
        db.initialize(false).await?;
        Ok(db)
    }

    async fn open_with(path: &str, wal_mode: bool) -> Result<Self, TenetError> {
        let conn = Connection::open(path).await.map_err(map_open_err)?;
        let db = Self { conn };
        db.initialize(wal_mode).await?;
        debug!(path, wal_mode, "database opened");
        Ok(db)
    }

    async fn initialize(&self, wal_mode: bool) -> Result<(), TenetError> {
        self.conn
            .call(move |conn| -> Result<(), TenetError> {
                let journal = if wal_mode { "WAL" } else { "DELETE" };
                conn.execute_batch(&format!(
                    "PRAGMA journal_mode = {journal};
                     PRAGMA synchronous = NORMAL;
                     PRAGMA foreign_keys = ON;
                     PRAGMA busy_timeout = {BUSY_TIMEOUT_MS};"
                ))
                .map_err(|e| TenetError::Storage {
                    source: Box::new(e),
                })?;
                run_migrations(conn)
            })
            .await
            .map_err(|e| match e {
                tokio_rusqlite::Error::Error(inner) => inner,
                other => TenetError::Storage {
                    source: Box::new(other),
                },
            })
    }

    /// The underlying single-writer connection. Query modules call through this.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Checkpoint the WAL into the main database file.
    ///
    /// Other clones of this handle stay usable; the background thread exits
    /// once the last clone is dropped.
    pub async fn close(&self) -> Result<(), TenetError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

/// Convert a tokio-rusqlite error into `TenetError::Storage`.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> TenetError {
    TenetError::Storage {
        source: Box::new(e),
    }
}

fn map_open_err(e: rusqlite::Error) -> TenetError {
    TenetError::Storage {
        source: Box::new(e),
    }
}
