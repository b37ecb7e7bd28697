//! Backend driver traits.
//!
//! These traits are the only way the adapter talks to a database. A driver
//! provides raw query execution, read-write transactions with batched
//! mutations, and a partitioned (non-transactional) update primitive.
//!
//! # Available Implementations
//!
//! | Backend | Use Case |
//! |---------|----------|
//! | `SqliteBackend` | Embedded, file or in-memory, `STRICT` tables |
//!
//! # Error Modes and Guarantees
//!
//! | Operation | Atomicity | Failure |
//! |-----------|-----------|---------|
//! | `execute` | Single statement | `Error::OperationFailed` |
//! | `run_transaction` | All-or-nothing | `Error::TransactionAborted`, nothing applied |
//! | `execute_partitioned_update` | Per partition, at-least-once | `Error::OperationFailed`, partial application possible |
//!
//! Drivers never retry. A transient failure (an aborted transaction, a lock
//! timeout) is returned to the caller as-is.

use super::{CommitResult, RowCursor};
use crate::Result;
use crate::models::Row;
use std::sync::Arc;

/// Body of a read-write transaction.
///
/// The body must call [`Transaction::commit`] exactly once on its success
/// path. Returning an error, or returning without committing, rolls the
/// transaction back.
pub type TransactionBody<'a> = dyn FnMut(&mut dyn Transaction) -> Result<()> + 'a;

/// A connected backend.
///
/// # Implementor Notes
///
/// - Methods take `&self`; one backend is shared by every caller of an adapter
/// - Concurrent transactions over one backend must be safe
/// - Row cursors returned by `execute` must not borrow the backend
pub trait Backend: Send + Sync {
    /// Short backend name used in logs and metrics.
    fn name(&self) -> &'static str;

    /// Executes `sql` and returns its rows.
    ///
    /// Statements that produce no rows return an empty cursor.
    fn execute(&self, sql: &str) -> Result<RowCursor>;

    /// Runs `body` inside a read-write transaction.
    ///
    /// Returns the commit result produced by the body's `commit` call. If the
    /// body fails, or returns without committing, nothing it wrote is visible.
    fn run_transaction(&self, body: &mut TransactionBody<'_>) -> Result<CommitResult>;

    /// Executes a partitioned update outside any transaction.
    ///
    /// The backend may apply the statement in independent sub-ranges, each at
    /// least once. Only idempotent statements are safe here.
    fn execute_partitioned_update(&self, sql: &str) -> Result<u64>;

    /// Releases the underlying connection.
    fn close(&self) -> Result<()>;
}

/// Handle to an open read-write transaction.
pub trait Transaction {
    /// Inserts rows into `table` in one batched call.
    fn insert_batch(&mut self, table: &str, rows: &[Row]) -> Result<()>;

    /// Updates rows of `table` in one batched call.
    ///
    /// Each row carries its primary key columns plus the columns to change.
    /// A row whose key does not exist fails the call.
    fn update_batch(&mut self, table: &str, rows: &[Row]) -> Result<()>;

    /// Inserts rows of `table`, updating the given columns of rows whose key
    /// already exists.
    fn upsert_batch(&mut self, table: &str, rows: &[Row]) -> Result<()>;

    /// Executes a DML statement and returns the number of affected rows.
    fn execute_update(&mut self, sql: &str) -> Result<u64>;

    /// Commits the transaction.
    fn commit(&mut self) -> Result<CommitResult>;
}

/// Opens backend connections.
///
/// The adapter calls `connect` at most once per adapter instance.
pub trait Connector: Send + Sync {
    /// Opens a connection to the configured database.
    fn connect(&self) -> Result<Arc<dyn Backend>>;
}
