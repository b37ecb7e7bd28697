//! Atomic mutation units.
//!
//! Every write the adapter performs is described as a [`TransactionUnit`], an
//! ordered list of [`BatchMutation`]s, and applied by the
//! [`TransactionCoordinator`] inside one read-write transaction. Either every
//! mutation of the unit becomes visible or none does.
//!
//! # Validation
//!
//! Units are validated before the backend is touched:
//! - a unit has at least one mutation, and every mutation at least one row
//! - rows of an insert or upsert batch share the first row's columns
//! - table and column names are quotable identifiers
//!
//! A failed validation never opens a transaction.

use crate::models::{Row, Value};
use crate::observability::{record_operation_metrics, status_label};
use crate::sql::{quote_identifier, sanitize};
use crate::storage::{Backend, CommitResult, Transaction};
use crate::{Error, Result};
use std::time::Instant;
use tracing::instrument;

/// Kind of a batched mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    /// Insert new rows; an existing key fails the unit.
    Insert,
    /// Update existing rows by key; a missing key fails the unit.
    Update,
    /// Insert rows, or update the given columns where the key exists.
    Upsert,
}

impl MutationKind {
    /// Lowercase name for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Upsert => "upsert",
        }
    }
}

/// One batched mutation against one table.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchMutation {
    table: String,
    kind: MutationKind,
    rows: Vec<Row>,
}

impl BatchMutation {
    /// Creates a mutation.
    #[must_use]
    pub fn new(table: impl Into<String>, kind: MutationKind, rows: Vec<Row>) -> Self {
        Self {
            table: table.into(),
            kind,
            rows,
        }
    }

    /// An insert batch.
    #[must_use]
    pub fn insert(table: impl Into<String>, rows: Vec<Row>) -> Self {
        Self::new(table, MutationKind::Insert, rows)
    }

    /// An update batch.
    #[must_use]
    pub fn update(table: impl Into<String>, rows: Vec<Row>) -> Self {
        Self::new(table, MutationKind::Update, rows)
    }

    /// An upsert batch.
    #[must_use]
    pub fn upsert(table: impl Into<String>, rows: Vec<Row>) -> Self {
        Self::new(table, MutationKind::Upsert, rows)
    }

    /// Target table.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Mutation kind.
    #[must_use]
    pub const fn kind(&self) -> MutationKind {
        self.kind
    }

    /// Rows of the batch.
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    fn validate(&self) -> Result<()> {
        quote_identifier(&self.table)?;
        let Some(first) = self.rows.first() else {
            return Err(Error::InvalidInput(format!(
                "{} into {} has no rows",
                self.kind.as_str(),
                self.table
            )));
        };

        for (pos, row) in self.rows.iter().enumerate() {
            if row.is_empty() {
                return Err(Error::InvalidInput(format!(
                    "row {pos} for {} has no columns",
                    self.table
                )));
            }
            for column in row.column_names() {
                quote_identifier(column)?;
            }
            // Update rows are applied one by one and may change different columns.
            if self.kind != MutationKind::Update && !row.same_columns(first) {
                return Err(Error::InvalidInput(format!(
                    "invalid data for {}: row {pos} has different columns than row 0",
                    self.table
                )));
            }
        }
        Ok(())
    }

    fn apply(&self, tx: &mut dyn Transaction) -> Result<()> {
        match self.kind {
            MutationKind::Insert => tx.insert_batch(&self.table, &self.rows),
            MutationKind::Update => tx.update_batch(&self.table, &self.rows),
            MutationKind::Upsert => tx.upsert_batch(&self.table, &self.rows),
        }
    }
}

/// Ordered mutations applied atomically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionUnit {
    mutations: Vec<BatchMutation>,
}

impl TransactionUnit {
    /// Creates an empty unit.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            mutations: Vec::new(),
        }
    }

    /// Appends a mutation.
    #[must_use]
    pub fn with(mut self, mutation: BatchMutation) -> Self {
        self.mutations.push(mutation);
        self
    }

    /// Appends a mutation in place.
    pub fn push(&mut self, mutation: BatchMutation) {
        self.mutations.push(mutation);
    }

    /// One insert batch per table, paired by position.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Alignment`] if `tables` and `row_sets` differ in length.
    pub fn across_tables(tables: &[&str], row_sets: Vec<Vec<Row>>) -> Result<Self> {
        if tables.len() != row_sets.len() {
            return Err(Error::Alignment {
                tables: tables.len(),
                row_sets: row_sets.len(),
            });
        }
        Ok(Self {
            mutations: tables
                .iter()
                .zip(row_sets)
                .map(|(table, rows)| BatchMutation::insert(*table, rows))
                .collect(),
        })
    }

    /// Mutations in application order.
    #[must_use]
    pub fn mutations(&self) -> &[BatchMutation] {
        &self.mutations
    }

    /// Number of mutations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    /// Returns true if the unit has no mutations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    /// Checks the unit without touching a backend.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.mutations.is_empty() {
            return Err(Error::InvalidInput(
                "transaction unit has no mutations".to_string(),
            ));
        }
        self.mutations.iter().try_for_each(BatchMutation::validate)
    }
}

/// Result of an atomic delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOutcome {
    /// Rows removed.
    pub rows_affected: u64,
    /// Commit of the delete transaction.
    pub commit: CommitResult,
}

/// Applies mutation units to a backend.
pub struct TransactionCoordinator<'a> {
    backend: &'a dyn Backend,
}

impl<'a> TransactionCoordinator<'a> {
    /// Creates a coordinator over `backend`.
    #[must_use]
    pub const fn new(backend: &'a dyn Backend) -> Self {
        Self { backend }
    }

    /// Applies every mutation of `unit` in one transaction and commits once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the unit fails validation, or the
    /// backend's error if any mutation or the commit fails. Nothing is applied
    /// in either case.
    #[instrument(skip(self, unit), fields(operation = "apply", backend = self.backend.name(), mutations = unit.len()))]
    pub fn apply(&self, unit: &TransactionUnit) -> Result<CommitResult> {
        unit.validate()?;

        let start = Instant::now();
        let mut body = |tx: &mut dyn Transaction| -> Result<()> {
            for mutation in unit.mutations() {
                mutation.apply(tx)?;
            }
            tx.commit()?;
            Ok(())
        };
        let result = self.backend.run_transaction(&mut body);

        if let Err(e) = &result {
            tracing::warn!(error = %e, "transaction unit aborted");
        }
        record_operation_metrics(self.backend.name(), "apply", start, status_label(&result));
        result
    }

    /// Inserts one row.
    ///
    /// # Errors
    ///
    /// See [`Self::apply`].
    pub fn insert_one(&self, table: &str, row: Row) -> Result<CommitResult> {
        self.apply(&TransactionUnit::new().with(BatchMutation::insert(table, vec![row])))
    }

    /// Inserts rows into one table in a single batch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for an empty list or rows whose columns
    /// differ from the first row. See also [`Self::apply`].
    pub fn insert_many(&self, table: &str, rows: Vec<Row>) -> Result<CommitResult> {
        self.apply(&TransactionUnit::new().with(BatchMutation::insert(table, rows)))
    }

    /// Inserts `row_sets[i]` into `tables[i]`, all in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Alignment`] before any backend call if the sequences
    /// differ in length. See also [`Self::apply`].
    pub fn insert_across_tables(
        &self,
        tables: &[&str],
        row_sets: Vec<Vec<Row>>,
    ) -> Result<CommitResult> {
        self.apply(&TransactionUnit::across_tables(tables, row_sets)?)
    }

    /// Inserts rows given as value lists ordered by `columns`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if a value list's width differs from
    /// `columns`. See also [`Self::insert_many`].
    pub fn insert_array(
        &self,
        table: &str,
        columns: &[&str],
        values: Vec<Vec<Value>>,
    ) -> Result<CommitResult> {
        self.insert_many(table, rows_from_values(table, columns, values)?)
    }

    /// Updates one row by key.
    ///
    /// # Errors
    ///
    /// Fails if the key does not exist. See also [`Self::apply`].
    pub fn update_one(&self, table: &str, row: Row) -> Result<CommitResult> {
        self.apply(&TransactionUnit::new().with(BatchMutation::update(table, vec![row])))
    }

    /// Inserts rows, updating the listed columns of rows whose key exists.
    ///
    /// # Errors
    ///
    /// See [`Self::insert_many`].
    pub fn upsert_many(&self, table: &str, rows: Vec<Row>) -> Result<CommitResult> {
        self.apply(&TransactionUnit::new().with(BatchMutation::upsert(table, rows)))
    }

    /// Deletes matching rows in one transaction.
    ///
    /// An empty `where_clause` deletes every row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for a bad table name, or the backend's
    /// error; on error no row is deleted.
    #[instrument(skip(self, where_clause), fields(operation = "delete_where", backend = self.backend.name()))]
    pub fn delete_where(&self, table: &str, where_clause: &str) -> Result<DeleteOutcome> {
        let sql = delete_statement(table, where_clause)?;

        let start = Instant::now();
        let mut rows_affected = 0;
        let mut body = |tx: &mut dyn Transaction| -> Result<()> {
            rows_affected = tx.execute_update(&sql)?;
            tx.commit()?;
            Ok(())
        };
        let result = self.backend.run_transaction(&mut body);
        record_operation_metrics(self.backend.name(), "delete_where", start, status_label(&result));

        let commit = result?;
        tracing::debug!(rows_affected, "atomic delete committed");
        Ok(DeleteOutcome {
            rows_affected,
            commit,
        })
    }

    /// Deletes matching rows with a partitioned update.
    ///
    /// Runs outside any transaction: each partition is applied at least once
    /// and the delete is not atomic with concurrent writes. Use it only for
    /// unconditional, idempotent deletes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for a bad table name, or the backend's
    /// error; some partitions may already be applied.
    #[instrument(skip(self, where_clause), fields(operation = "delete_where_partitioned", backend = self.backend.name()))]
    pub fn delete_where_partitioned(&self, table: &str, where_clause: &str) -> Result<u64> {
        let sql = delete_statement(table, where_clause)?;

        let start = Instant::now();
        let result = self.backend.execute_partitioned_update(&sql);
        record_operation_metrics(
            self.backend.name(),
            "delete_where_partitioned",
            start,
            status_label(&result),
        );
        result
    }
}

/// Pairs each value list with `columns`, in order.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if a value list's width differs from
/// `columns`.
pub fn rows_from_values(table: &str, columns: &[&str], values: Vec<Vec<Value>>) -> Result<Vec<Row>> {
    values
        .into_iter()
        .enumerate()
        .map(|(pos, values)| {
            if values.len() != columns.len() {
                return Err(Error::InvalidInput(format!(
                    "invalid data for insert into {table}: row {pos} has {} values for {} columns",
                    values.len(),
                    columns.len()
                )));
            }
            Ok(columns.iter().copied().zip(values).collect::<Row>())
        })
        .collect()
}

pub(crate) fn delete_statement(table: &str, where_clause: &str) -> Result<String> {
    let predicate = match where_clause.trim() {
        "" => "true",
        clause => clause,
    };
    Ok(sanitize(&format!(
        "DELETE FROM {} WHERE {predicate}",
        quote_identifier(table)?
    )))
}
