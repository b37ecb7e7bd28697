//! `SQLite` backend.

use super::connection::{acquire_lock, configure_connection};
use super::transaction::SqliteTransaction;
use super::values::read_row;
use crate::config::AdapterConfig;
use crate::observability::{record_operation_metrics, status_label};
use crate::storage::{Backend, CommitResult, Connector, RowCursor, Transaction, TransactionBody};
use crate::{Error, Result};
use rusqlite::{Connection, TransactionBehavior};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::instrument;

const BACKEND: &str = "sqlite";

/// Embedded backend over a single `SQLite` connection.
///
/// Declare tables `STRICT` to get the backend's type discipline: a `STRICT`
/// table rejects values that do not match the declared column type instead of
/// storing them under a different type.
///
/// # Concurrency Model
///
/// Uses a `Mutex<Option<Connection>>` because `rusqlite::Connection` is not
/// `Sync`. Transactions take the lock for their whole body, so concurrent
/// transactions are serialized rather than interleaved. `None` means the
/// connection was closed.
pub struct SqliteBackend {
    conn: Mutex<Option<Connection>>,
    db_path: Option<PathBuf>,
}

impl SqliteBackend {
    /// Opens (creating if needed) a database file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the file cannot be opened or configured.
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        let conn = Connection::open(&db_path).map_err(|e| Error::Connection {
            cause: format!("{}: {e}", db_path.display()),
        })?;
        configure_connection(&conn)?;

        Ok(Self {
            conn: Mutex::new(Some(conn)),
            db_path: Some(db_path),
        })
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the database cannot be configured.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| Error::Connection {
            cause: e.to_string(),
        })?;
        configure_connection(&conn)?;

        Ok(Self {
            conn: Mutex::new(Some(conn)),
            db_path: None,
        })
    }

    /// Returns the database path (None for in-memory).
    #[must_use]
    pub const fn db_path(&self) -> Option<&PathBuf> {
        self.db_path.as_ref()
    }

    fn query_rows(&self, sql: &str) -> Result<RowCursor> {
        let guard = acquire_lock(&self.conn);
        let conn = guard.as_ref().ok_or(Error::ConnectionClosed)?;

        let mut stmt = conn.prepare(sql).map_err(|e| failed("execute", e))?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let rows = stmt
            .query_map([], |row| read_row(row, &columns))
            .map_err(|e| failed("execute", e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| failed("execute", e))?;

        Ok(RowCursor::from_rows(rows))
    }

    fn transaction(&self, body: &mut TransactionBody<'_>) -> Result<CommitResult> {
        let mut guard = acquire_lock(&self.conn);
        let conn = guard.as_mut().ok_or(Error::ConnectionClosed)?;

        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| Error::TransactionAborted {
                operation: "begin".to_string(),
                cause: e.to_string(),
            })?;
        let mut handle = SqliteTransaction::new(tx);
        let outcome = body(&mut handle as &mut dyn Transaction);
        let committed = handle.committed();
        // Rolls back unless committed.
        drop(handle);

        match (outcome, committed) {
            (Ok(()), Some(commit)) => Ok(commit),
            (Ok(()), None) => Err(Error::TransactionAborted {
                operation: "run_transaction".to_string(),
                cause: "transaction body returned without committing".to_string(),
            }),
            (Err(e), Some(_)) => {
                tracing::warn!(error = %e, "transaction body failed after commit");
                Err(e)
            },
            (Err(e), None) => Err(e),
        }
    }
}

impl Backend for SqliteBackend {
    fn name(&self) -> &'static str {
        BACKEND
    }

    #[instrument(skip(self, sql), fields(operation = "execute", backend = BACKEND))]
    fn execute(&self, sql: &str) -> Result<RowCursor> {
        let start = Instant::now();
        let result = self.query_rows(sql);
        record_operation_metrics(BACKEND, "execute", start, status_label(&result));
        result
    }

    #[instrument(skip(self, body), fields(operation = "run_transaction", backend = BACKEND))]
    fn run_transaction(&self, body: &mut TransactionBody<'_>) -> Result<CommitResult> {
        let start = Instant::now();
        let result = self.transaction(body);
        if let Err(e) = &result {
            tracing::debug!(error = %e, "transaction rolled back");
        }
        record_operation_metrics(BACKEND, "run_transaction", start, status_label(&result));
        result
    }

    #[instrument(skip(self, sql), fields(operation = "partitioned_update", backend = BACKEND))]
    fn execute_partitioned_update(&self, sql: &str) -> Result<u64> {
        let start = Instant::now();
        let result = (|| -> Result<u64> {
            let guard = acquire_lock(&self.conn);
            let conn = guard.as_ref().ok_or(Error::ConnectionClosed)?;
            // Autocommit: each statement stands alone, like a partition.
            let affected = conn
                .execute(sql, [])
                .map_err(|e| failed("execute_partitioned_update", e))?;
            Ok(affected as u64)
        })();
        record_operation_metrics(BACKEND, "partitioned_update", start, status_label(&result));
        result
    }

    fn close(&self) -> Result<()> {
        let mut guard = acquire_lock(&self.conn);
        if let Some(conn) = guard.take() {
            conn.close().map_err(|(_, e)| failed("close", e))?;
            tracing::debug!(path = ?self.db_path, "sqlite connection closed");
        }
        Ok(())
    }
}

/// Opens [`SqliteBackend`]s for an adapter.
#[derive(Debug, Clone, Default)]
pub struct SqliteConnector {
    db_path: Option<PathBuf>,
}

impl SqliteConnector {
    /// Connects to a database file.
    #[must_use]
    pub fn file(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: Some(db_path.into()),
        }
    }

    /// Connects to a private in-memory database.
    #[must_use]
    pub const fn in_memory() -> Self {
        Self { db_path: None }
    }

    /// Uses the configured database path, or memory if none is set.
    #[must_use]
    pub fn from_config(config: &AdapterConfig) -> Self {
        Self {
            db_path: config.database_path.clone(),
        }
    }
}

impl Connector for SqliteConnector {
    fn connect(&self) -> Result<Arc<dyn Backend>> {
        let backend = match &self.db_path {
            Some(path) => SqliteBackend::open(path)?,
            None => SqliteBackend::in_memory()?,
        };
        tracing::info!(path = ?self.db_path, "connected to sqlite backend");
        Ok(Arc::new(backend))
    }
}

fn failed(operation: &str, cause: rusqlite::Error) -> Error {
    Error::OperationFailed {
        operation: operation.to_string(),
        cause: cause.to_string(),
    }
}
