// SPDX-FileCopyrightText: 2026 Officehours Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use std::path::Path;

use officehours_core::OfficeHoursError;
use tracing::debug;

use crate::migrations;

/// Handle to the single SQLite connection.
///
/// Cloning the inner connection is cheap; every clone talks to the same
/// background thread.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (creating if needed) the database at `path` in WAL mode and run
    /// pending migrations.
    pub async fn open(path: &str) -> Result<Self, OfficeHoursError> {
        Self::open_with(path, true).await
    }

    /// Open with an explicit journal mode choice.
    pub async fn open_with(path: &str, wal_mode: bool) -> Result<Self, OfficeHoursError> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| OfficeHoursError::Storage {
                    source: Box::new(e),
                })?;
            }
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| OfficeHoursError::Storage {
                source: Box::new(e),
            })?;

        conn.call(move |conn| -> Result<(), OfficeHoursError> {
            let journal = if wal_mode { "WAL" } else { "DELETE" };
            conn.execute_batch(&format!(
                "PRAGMA journal_mode = {journal};
                 PRAGMA synchronous = NORMAL;
                 PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;"
            ))
            .map_err(sql_err)?;
            migrations::run_migrations(conn)
        })
        .await
        .map_err(flatten_err)?;

        debug!(path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// The shared tokio-rusqlite connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), OfficeHoursError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
            })
            .await
            .map_err(map_tr_err)?;
        self.conn.close().await.map_err(|e| OfficeHoursError::Storage {
            source: Box::new(e),
        })
    }
}

/// Convert a tokio-rusqlite error into `OfficeHoursError::Storage`.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> OfficeHoursError {
    OfficeHoursError::Storage {
        source: Box::new(e),
    }
}

/// Unwraps errors from closures that already speak `OfficeHoursError`.
pub(crate) fn flatten_err(e: tokio_rusqlite::Error<OfficeHoursError>) -> OfficeHoursError {
    match e {
        tokio_rusqlite::Error::Error(inner) => inner,
        other => OfficeHoursError::Storage {
            source: other.to_string().into(),
        },
    }
}

pub(crate) fn sql_err(e: rusqlite::Error) -> OfficeHoursError {
    OfficeHoursError::Storage {
        source: Box::new(e),
    }
}
