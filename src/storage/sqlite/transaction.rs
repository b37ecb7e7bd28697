//! Read-write transaction handle for the `SQLite` backend.

use super::statements::{insert_sql, update_sql, upsert_sql};
use crate::models::{Row, Value};
use crate::storage::{CommitResult, Transaction};
use crate::{Error, Result};
use chrono::Utc;
use rusqlite::params_from_iter;

/// An open `SQLite` transaction.
///
/// Dropping the handle without committing rolls the transaction back.
pub struct SqliteTransaction<'conn> {
    tx: Option<rusqlite::Transaction<'conn>>,
    committed: Option<CommitResult>,
}

impl<'conn> SqliteTransaction<'conn> {
    /// Wraps an open transaction.
    pub const fn new(tx: rusqlite::Transaction<'conn>) -> Self {
        Self {
            tx: Some(tx),
            committed: None,
        }
    }

    /// The commit result, once `commit` has succeeded.
    pub const fn committed(&self) -> Option<CommitResult> {
        self.committed
    }

    fn active(&self, operation: &str) -> Result<&rusqlite::Transaction<'conn>> {
        self.tx
            .as_ref()
            .ok_or_else(|| aborted(operation, "transaction already committed"))
    }

    /// Primary key columns of `table`, in key order.
    fn key_columns(&self, table: &str) -> Result<Vec<String>> {
        let tx = self.active("key_columns")?;
        let mut stmt = tx
            .prepare_cached("SELECT name FROM pragma_table_info(?1) WHERE pk > 0 ORDER BY pk")
            .map_err(|e| aborted("key_columns", e))?;
        let keys = stmt
            .query_map([table], |row| row.get::<_, String>(0))
            .map_err(|e| aborted("key_columns", e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| aborted("key_columns", e))?;

        if keys.is_empty() {
            return Err(aborted(
                "key_columns",
                format!("table {table} has no primary key or does not exist"),
            ));
        }
        Ok(keys)
    }

    /// Binds each row's values in `columns` order and executes `sql` once per row.
    ///
    /// Returns the affected row count of each execution.
    fn execute_rows(
        &self,
        operation: &str,
        sql: &str,
        columns: &[&str],
        rows: &[Row],
    ) -> Result<Vec<usize>> {
        let tx = self.active(operation)?;
        let mut stmt = tx.prepare_cached(sql).map_err(|e| aborted(operation, e))?;
        rows.iter()
            .map(|row| {
                let values = columns.iter().map(|c| row.get(c).unwrap_or(&Value::Null));
                stmt.execute(params_from_iter(values))
                    .map_err(|e| aborted(operation, e))
            })
            .collect()
    }
}

impl Transaction for SqliteTransaction<'_> {
    fn insert_batch(&mut self, table: &str, rows: &[Row]) -> Result<()> {
        let Some(columns) = shared_columns(table, rows)? else {
            return Ok(());
        };
        let sql = insert_sql(table, &columns)?;
        self.execute_rows("insert_batch", &sql, &columns, rows)?;
        Ok(())
    }

    fn update_batch(&mut self, table: &str, rows: &[Row]) -> Result<()> {
        let keys = self.key_columns(table)?;
        let keys: Vec<&str> = keys.iter().map(String::as_str).collect();

        for row in rows {
            require_keys(table, row, &keys)?;
            let set_columns: Vec<&str> = row.column_names().filter(|c| !keys.contains(c)).collect();
            if set_columns.is_empty() {
                return Err(Error::InvalidInput(format!(
                    "update of {table} changes no columns"
                )));
            }

            let sql = update_sql(table, &set_columns, &keys)?;
            let bind_order: Vec<&str> = set_columns.iter().chain(keys.iter()).copied().collect();
            let affected = self.execute_rows("update_batch", &sql, &bind_order, std::slice::from_ref(row))?;
            if affected.iter().sum::<usize>() == 0 {
                return Err(aborted("update_batch", format!("row not found in {table}")));
            }
        }
        Ok(())
    }

    fn upsert_batch(&mut self, table: &str, rows: &[Row]) -> Result<()> {
        let Some(columns) = shared_columns(table, rows)? else {
            return Ok(());
        };
        let keys = self.key_columns(table)?;
        let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
        for row in rows {
            require_keys(table, row, &keys)?;
        }

        let sql = upsert_sql(table, &columns, &keys)?;
        self.execute_rows("upsert_batch", &sql, &columns, rows)?;
        Ok(())
    }

    fn execute_update(&mut self, sql: &str) -> Result<u64> {
        let tx = self.active("execute_update")?;
        let affected = tx.execute(sql, []).map_err(|e| aborted("execute_update", e))?;
        Ok(affected as u64)
    }

    fn commit(&mut self) -> Result<CommitResult> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| aborted("commit", "transaction already committed"))?;
        tx.commit().map_err(|e| aborted("commit", e))?;

        let result = CommitResult::new(Utc::now());
        self.committed = Some(result);
        Ok(result)
    }
}

/// Column names shared by every row of a batch, in the first row's order.
///
/// Returns `None` for an empty batch.
fn shared_columns<'r>(table: &str, rows: &'r [Row]) -> Result<Option<Vec<&'r str>>> {
    let Some(first) = rows.first() else {
        return Ok(None);
    };
    if first.is_empty() {
        return Err(Error::InvalidInput(format!("row for {table} has no columns")));
    }
    if let Some(pos) = rows.iter().position(|row| !row.same_columns(first)) {
        return Err(Error::InvalidInput(format!(
            "row {pos} for {table} has different columns than row 0"
        )));
    }
    Ok(Some(first.column_names().collect()))
}

fn require_keys(table: &str, row: &Row, keys: &[&str]) -> Result<()> {
    match keys.iter().find(|key| !row.contains(key)) {
        Some(missing) => Err(Error::InvalidInput(format!(
            "row for {table} is missing key column {missing}"
        ))),
        None => Ok(()),
    }
}

fn aborted(operation: &str, cause: impl ToString) -> Error {
    Error::TransactionAborted {
        operation: operation.to_string(),
        cause: cause.to_string(),
    }
}
