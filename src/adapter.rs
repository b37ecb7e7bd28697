//! The adapter façade.
//!
//! [`SpannerAdapter`] owns at most one backend connection and exposes the
//! loosely-typed calling convention legacy callers expect: string SQL in,
//! rows out, dates as canonical UTC strings, identifiers generated on the
//! adapter side.
//!
//! # Connection Lifecycle
//!
//! ```text
//! Unconnected ──first use / connect()──▶ Connected ──close_connection()──▶ Closed
//!      │                                                                     ▲
//!      └──────────────────────────close_connection()─────────────────────────┘
//! ```
//!
//! `Closed` is terminal: every operation that needs the connection returns
//! [`Error::ConnectionClosed`].

use crate::config::{AdapterConfig, DeleteMode};
use crate::dates;
use crate::identity::IdentityGenerator;
use crate::models::{Row, Value};
use crate::rows::{collect_all, collect_first, collect_scalar};
use crate::sql;
use crate::storage::{Backend, CommitResult, Connector, RowCursor, SqliteConnector};
use crate::transaction::{
    BatchMutation, DeleteOutcome, TransactionCoordinator, TransactionUnit, rows_from_values,
};
use crate::{Error, Result};
use chrono::{DateTime, TimeZone};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::instrument;

/// Result of [`SpannerAdapter::raw_fetch_row`].
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched {
    /// The whole first row.
    Row(Row),
    /// One field of the first row.
    Field(Value),
}

enum ConnectionState {
    Unconnected,
    Connected(Arc<dyn Backend>),
    Closed,
}

impl ConnectionState {
    const fn label(&self) -> &'static str {
        match self {
            Self::Unconnected => "unconnected",
            Self::Connected(_) => "connected",
            Self::Closed => "closed",
        }
    }
}

/// Database adapter over a strictly-typed transactional backend.
///
/// The adapter is `Send + Sync`. The connection state lock is held only while
/// the state is read or changed; statements run on a cloned backend handle.
pub struct SpannerAdapter {
    connector: Box<dyn Connector>,
    state: Mutex<ConnectionState>,
    identity: IdentityGenerator,
    delete_mode: DeleteMode,
}

impl SpannerAdapter {
    /// Creates an adapter that connects on first use.
    #[must_use]
    pub fn new(connector: Box<dyn Connector>) -> Self {
        Self {
            connector,
            state: Mutex::new(ConnectionState::Unconnected),
            identity: IdentityGenerator::default(),
            delete_mode: DeleteMode::default(),
        }
    }

    /// Creates an adapter and connects immediately.
    ///
    /// # Errors
    ///
    /// Returns the connector's error if the database cannot be opened.
    pub fn connect(connector: Box<dyn Connector>) -> Result<Self> {
        let adapter = Self::new(connector);
        adapter.backend()?;
        Ok(adapter)
    }

    /// Creates a lazily-connecting adapter with configured strategies.
    #[must_use]
    pub fn with_config(connector: Box<dyn Connector>, config: &AdapterConfig) -> Self {
        Self {
            identity: IdentityGenerator::new(config.identity),
            delete_mode: config.delete_mode,
            ..Self::new(connector)
        }
    }

    /// Creates a lazily-connecting adapter over the bundled `SQLite` backend.
    #[must_use]
    pub fn from_config(config: &AdapterConfig) -> Self {
        Self::with_config(Box::new(SqliteConnector::from_config(config)), config)
    }

    /// Strategy used by [`Self::delete`].
    #[must_use]
    pub const fn delete_mode(&self) -> DeleteMode {
        self.delete_mode
    }

    /// Returns true while a connection is open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        matches!(*self.lock_state(), ConnectionState::Connected(_))
    }

    /// Returns true once the connection has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(*self.lock_state(), ConnectionState::Closed)
    }

    fn lock_state(&self) -> MutexGuard<'_, ConnectionState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("adapter state mutex was poisoned, recovering");
                poisoned.into_inner()
            },
        }
    }

    /// Returns the live backend, connecting first if needed.
    fn backend(&self) -> Result<Arc<dyn Backend>> {
        let mut state = self.lock_state();
        match &*state {
            ConnectionState::Connected(backend) => Ok(Arc::clone(backend)),
            ConnectionState::Closed => Err(Error::ConnectionClosed),
            ConnectionState::Unconnected => {
                let backend = self.connector.connect()?;
                tracing::debug!(backend = backend.name(), "adapter connected");
                *state = ConnectionState::Connected(Arc::clone(&backend));
                Ok(backend)
            },
        }
    }

    /// Closes the connection. Calling it again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the backend's error if releasing the connection fails; the
    /// adapter is closed regardless.
    pub fn close_connection(&self) -> Result<()> {
        let previous = std::mem::replace(&mut *self.lock_state(), ConnectionState::Closed);
        tracing::debug!(from = previous.label(), "closing adapter connection");
        match previous {
            ConnectionState::Connected(backend) => backend.close(),
            ConnectionState::Unconnected | ConnectionState::Closed => Ok(()),
        }
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Sanitizes `sql` and executes it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] after close, the connector's error
    /// if connecting fails, or the backend's error.
    #[instrument(skip(self, sql), fields(operation = "query"))]
    pub fn query(&self, sql: &str) -> Result<RowCursor> {
        let sanitized = sql::sanitize(sql);
        tracing::trace!(sql = %sanitized, "executing query");
        self.backend()?.execute(&sanitized)
    }

    /// Same as [`Self::query`]; literals are sanitized on this path too.
    ///
    /// # Errors
    ///
    /// See [`Self::query`].
    pub fn raw_query(&self, sql: &str) -> Result<RowCursor> {
        self.query(sql)
    }

    /// All rows of a sanitized query.
    ///
    /// # Errors
    ///
    /// See [`Self::query`].
    pub fn fetch_all(&self, sql: &str) -> Result<Vec<Row>> {
        collect_all(self.query(sql)?)
    }

    /// First row of a sanitized query, or `None` when there are no rows.
    ///
    /// # Errors
    ///
    /// See [`Self::query`].
    pub fn fetch_row(&self, sql: &str) -> Result<Option<Row>> {
        collect_first(self.query(sql)?)
    }

    /// First column of the first row of a sanitized query.
    ///
    /// # Errors
    ///
    /// See [`Self::query`].
    pub fn fetch_one(&self, sql: &str) -> Result<Option<Value>> {
        collect_scalar(self.query(sql)?)
    }

    /// First row of a sanitized query, or one field of it.
    ///
    /// Returns `None` when there is no row or the row has no such field. A
    /// `field` of `None` or `""` returns the whole row.
    ///
    /// # Errors
    ///
    /// See [`Self::query`].
    pub fn raw_fetch_row(&self, sql: &str, field: Option<&str>) -> Result<Option<Fetched>> {
        let Some(row) = collect_first(self.raw_query(sql)?)? else {
            return Ok(None);
        };
        Ok(match field.filter(|f| !f.is_empty()) {
            None => Some(Fetched::Row(row)),
            Some(field) => row.get(field).cloned().map(Fetched::Field),
        })
    }

    /// Wraps every occurrence of `column` in `CAST(column AS ty)`.
    ///
    /// See [`sql::add_cast`] for the substring caveat.
    #[must_use]
    pub fn add_cast(sql: &str, column: &str, ty: &str) -> String {
        sql::add_cast(sql, column, ty)
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Applies a unit of mutations atomically.
    ///
    /// The unit is validated before a connection is acquired, so invalid
    /// input never reaches the backend.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for an invalid unit, or the backend's
    /// error; nothing is applied on error.
    pub fn apply(&self, unit: &TransactionUnit) -> Result<CommitResult> {
        unit.validate()?;
        let backend = self.backend()?;
        TransactionCoordinator::new(backend.as_ref()).apply(unit)
    }

    /// Inserts one row.
    ///
    /// # Errors
    ///
    /// See [`Self::apply`].
    pub fn insert_one(&self, table: &str, row: Row) -> Result<CommitResult> {
        self.apply(&TransactionUnit::new().with(BatchMutation::insert(table, vec![row])))
    }

    /// Inserts rows into one table atomically.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for an empty list or rows with
    /// differing columns. See also [`Self::apply`].
    pub fn insert_many(&self, table: &str, rows: Vec<Row>) -> Result<CommitResult> {
        self.apply(&TransactionUnit::new().with(BatchMutation::insert(table, rows)))
    }

    /// Inserts `row_sets[i]` into `tables[i]` atomically.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Alignment`] without touching the backend if the
    /// sequences differ in length. See also [`Self::apply`].
    pub fn insert_across_tables(
        &self,
        tables: &[&str],
        row_sets: Vec<Vec<Row>>,
    ) -> Result<CommitResult> {
        self.apply(&TransactionUnit::across_tables(tables, row_sets)?)
    }

    /// Inserts value lists ordered by `columns`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if a list's width differs from
    /// `columns`. See also [`Self::apply`].
    pub fn insert_array(
        &self,
        table: &str,
        columns: &[&str],
        values: Vec<Vec<Value>>,
    ) -> Result<CommitResult> {
        self.insert_many(table, rows_from_values(table, columns, values)?)
    }

    /// Inserts `row` with `key_column` set to a freshly generated identifier.
    ///
    /// Returns the identifier with the commit.
    ///
    /// # Errors
    ///
    /// See [`Self::apply`].
    pub fn insert_with_generated_id(
        &self,
        table: &str,
        key_column: &str,
        mut row: Row,
    ) -> Result<(String, CommitResult)> {
        let id = self.next_id();
        row.set(key_column, id.as_str());
        let commit = self.insert_one(table, row)?;
        Ok((id, commit))
    }

    /// Updates one row by key.
    ///
    /// # Errors
    ///
    /// Fails if the key does not exist. See also [`Self::apply`].
    pub fn update_one(&self, table: &str, row: Row) -> Result<CommitResult> {
        self.apply(&TransactionUnit::new().with(BatchMutation::update(table, vec![row])))
    }

    /// Inserts rows, updating the listed columns where the key exists.
    ///
    /// # Errors
    ///
    /// See [`Self::insert_many`].
    pub fn upsert_many(&self, table: &str, rows: Vec<Row>) -> Result<CommitResult> {
        self.apply(&TransactionUnit::new().with(BatchMutation::upsert(table, rows)))
    }

    /// Deletes matching rows atomically. An empty clause deletes every row.
    ///
    /// # Errors
    ///
    /// Returns the backend's error; nothing is deleted on error.
    pub fn delete_where(&self, table: &str, where_clause: &str) -> Result<DeleteOutcome> {
        sql::quote_identifier(table)?;
        let backend = self.backend()?;
        TransactionCoordinator::new(backend.as_ref()).delete_where(table, where_clause)
    }

    /// Deletes matching rows with a partitioned update.
    ///
    /// Not atomic and at-least-once per partition; only for unconditional,
    /// idempotent deletes.
    ///
    /// # Errors
    ///
    /// Returns the backend's error; some rows may already be deleted.
    pub fn delete_where_partitioned(&self, table: &str, where_clause: &str) -> Result<u64> {
        sql::quote_identifier(table)?;
        let backend = self.backend()?;
        TransactionCoordinator::new(backend.as_ref()).delete_where_partitioned(table, where_clause)
    }

    /// Deletes matching rows using the configured [`DeleteMode`].
    ///
    /// Returns the number of rows deleted.
    ///
    /// # Errors
    ///
    /// See [`Self::delete_where`] and [`Self::delete_where_partitioned`].
    pub fn delete(&self, table: &str, where_clause: &str) -> Result<u64> {
        match self.delete_mode {
            DeleteMode::Atomic => Ok(self.delete_where(table, where_clause)?.rows_affected),
            DeleteMode::Partitioned => self.delete_where_partitioned(table, where_clause),
        }
    }

    // ------------------------------------------------------------------
    // Dates and identifiers
    // ------------------------------------------------------------------

    /// Encodes an instant as `YYYY-MM-DDTHH:MM:SS.000Z`.
    #[must_use]
    pub fn encode_date<Tz: TimeZone>(&self, instant: &DateTime<Tz>) -> String {
        dates::encode(instant)
    }

    /// Re-encodes a date string in the canonical form; `""` stays `""`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the input cannot be parsed.
    pub fn decode_date(&self, input: &str) -> Result<String> {
        dates::decode(input)
    }

    /// Formats a value for a DATE column (`YYYY-MM-DD`); empty gives `None`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the input cannot be parsed.
    pub fn convert_date(&self, input: &str) -> Result<Option<String>> {
        dates::format_date(input, false)
    }

    /// Formats a value for a TIMESTAMP column; empty gives `None`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the input cannot be parsed.
    pub fn convert_datetime(&self, input: &str) -> Result<Option<String>> {
        dates::format_date(input, true)
    }

    /// Generates a new row identifier.
    #[must_use]
    pub fn next_id(&self) -> String {
        self.identity.next_id()
    }
}

impl std::fmt::Debug for SpannerAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpannerAdapter")
            .field("state", &self.lock_state().label())
            .field("identity", &self.identity.strategy())
            .field("delete_mode", &self.delete_mode)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{IdentityStrategy, is_well_formed};
    use crate::storage::{Transaction, TransactionBody};
    use chrono::{FixedOffset, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Records every call that reaches the backend.
    #[derive(Default)]
    struct Recorder {
        connects: AtomicUsize,
        calls: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn record(&self, call: impl Into<String>) {
            self.calls.lock().unwrap().push(call.into());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    struct RecordingConnector {
        recorder: Arc<Recorder>,
        rows: Vec<Row>,
    }

    impl Connector for RecordingConnector {
        fn connect(&self) -> Result<Arc<dyn Backend>> {
            self.recorder.connects.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(RecordingBackend {
                recorder: Arc::clone(&self.recorder),
                rows: self.rows.clone(),
            }))
        }
    }

    struct RecordingBackend {
        recorder: Arc<Recorder>,
        rows: Vec<Row>,
    }

    impl Backend for RecordingBackend {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn execute(&self, sql: &str) -> Result<RowCursor> {
            self.recorder.record(format!("execute: {sql}"));
            Ok(RowCursor::from_rows(self.rows.clone()))
        }

        fn run_transaction(&self, body: &mut TransactionBody<'_>) -> Result<CommitResult> {
            self.recorder.record("begin");
            let mut tx = RecordingTransaction {
                recorder: Arc::clone(&self.recorder),
                committed: None,
            };
            body(&mut tx as &mut dyn Transaction)?;
            tx.committed.ok_or_else(|| Error::TransactionAborted {
                operation: "run_transaction".to_string(),
                cause: "not committed".to_string(),
            })
        }

        fn execute_partitioned_update(&self, sql: &str) -> Result<u64> {
            self.recorder.record(format!("partitioned: {sql}"));
            Ok(3)
        }

        fn close(&self) -> Result<()> {
            self.recorder.record("close");
            Ok(())
        }
    }

    struct RecordingTransaction {
        recorder: Arc<Recorder>,
        committed: Option<CommitResult>,
    }

    impl Transaction for RecordingTransaction {
        fn insert_batch(&mut self, table: &str, rows: &[Row]) -> Result<()> {
            self.recorder.record(format!("insert {table} x{}", rows.len()));
            Ok(())
        }

        fn update_batch(&mut self, table: &str, rows: &[Row]) -> Result<()> {
            self.recorder.record(format!("update {table} x{}", rows.len()));
            Ok(())
        }

        fn upsert_batch(&mut self, table: &str, rows: &[Row]) -> Result<()> {
            self.recorder.record(format!("upsert {table} x{}", rows.len()));
            Ok(())
        }

        fn execute_update(&mut self, sql: &str) -> Result<u64> {
            self.recorder.record(format!("update_sql: {sql}"));
            Ok(2)
        }

        fn commit(&mut self) -> Result<CommitResult> {
            self.recorder.record("commit");
            let result = CommitResult::new(Utc::now());
            self.committed = Some(result);
            Ok(result)
        }
    }

    fn adapter_with_rows(rows: Vec<Row>) -> (SpannerAdapter, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let connector = RecordingConnector {
            recorder: Arc::clone(&recorder),
            rows,
        };
        (SpannerAdapter::new(Box::new(connector)), recorder)
    }

    fn adapter() -> (SpannerAdapter, Arc<Recorder>) {
        adapter_with_rows(Vec::new())
    }

    #[test]
    fn test_adapter_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SpannerAdapter>();
    }

    #[test]
    fn test_connects_lazily_once() {
        let (adapter, recorder) = adapter();
        assert!(!adapter.is_connected());
        assert_eq!(recorder.connects.load(Ordering::SeqCst), 0);

        adapter.fetch_all("SELECT 1").unwrap();
        adapter.fetch_all("SELECT 2").unwrap();
        assert!(adapter.is_connected());
        assert_eq!(recorder.connects.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_connect_is_eager() {
        let recorder = Arc::new(Recorder::default());
        let adapter = SpannerAdapter::connect(Box::new(RecordingConnector {
            recorder: Arc::clone(&recorder),
            rows: Vec::new(),
        }))
        .unwrap();
        assert!(adapter.is_connected());
        assert_eq!(recorder.connects.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_query_and_raw_query_both_sanitize() {
        let (adapter, recorder) = adapter();
        adapter.query("SELECT * FROM t WHERE id = '42'").unwrap();
        adapter.raw_query("SELECT * FROM t WHERE id = '42'").unwrap();
        adapter
            .raw_fetch_row("SELECT * FROM t ORDER BY RAND()", None)
            .unwrap();
        assert_eq!(
            recorder.calls(),
            vec![
                "execute: SELECT * FROM t WHERE id = 42",
                "execute: SELECT * FROM t WHERE id = 42",
                "execute: SELECT * FROM t ORDER BY 1",
            ]
        );
    }

    #[test]
    fn test_fetch_row_empty_is_none() {
        let (adapter, _) = adapter();
        assert!(adapter.fetch_row("SELECT * FROM t").unwrap().is_none());
        assert!(adapter.fetch_one("SELECT * FROM t").unwrap().is_none());
    }

    #[test]
    fn test_raw_fetch_row() {
        let row = Row::new().with("id", 7).with("code", "admin");
        let (adapter, _) = adapter_with_rows(vec![row.clone()]);

        assert_eq!(
            adapter.raw_fetch_row("SELECT", None).unwrap(),
            Some(Fetched::Row(row.clone()))
        );
        assert_eq!(
            adapter.raw_fetch_row("SELECT", Some("")).unwrap(),
            Some(Fetched::Row(row))
        );
        assert_eq!(
            adapter.raw_fetch_row("SELECT", Some("code")).unwrap(),
            Some(Fetched::Field(Value::from("admin")))
        );
        assert_eq!(adapter.raw_fetch_row("SELECT", Some("missing")).unwrap(), None);
        assert_eq!(adapter.fetch_one("SELECT").unwrap(), Some(Value::Int64(7)));
    }

    #[test]
    fn test_alignment_error_touches_nothing() {
        let (adapter, recorder) = adapter();
        let err = adapter
            .insert_across_tables(&["a", "b"], vec![vec![Row::new().with("id", 1)]])
            .unwrap_err();
        assert!(matches!(err, Error::Alignment { tables: 2, row_sets: 1 }));
        assert_eq!(recorder.connects.load(Ordering::SeqCst), 0);
        assert!(recorder.calls().is_empty());
    }

    #[test]
    fn test_invalid_batch_touches_nothing() {
        let (adapter, recorder) = adapter();
        assert!(adapter.insert_many("t", Vec::new()).is_err());
        assert!(
            adapter
                .insert_array("t", &["a", "b"], vec![vec![Value::Null]])
                .is_err()
        );
        assert_eq!(recorder.connects.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unit_commits_once() {
        let (adapter, recorder) = adapter();
        adapter
            .insert_across_tables(
                &["quote", "quote_item"],
                vec![
                    vec![Row::new().with("id", 1)],
                    vec![Row::new().with("id", 1), Row::new().with("id", 2)],
                ],
            )
            .unwrap();
        assert_eq!(
            recorder.calls(),
            vec!["begin", "insert quote x1", "insert quote_item x2", "commit"]
        );
    }

    #[test]
    fn test_delete_modes() {
        let (adapter, recorder) = adapter();
        assert_eq!(adapter.delete("quote", "id = '5'").unwrap(), 2);
        assert_eq!(adapter.delete_where_partitioned("quote", "").unwrap(), 3);
        assert_eq!(
            recorder.calls(),
            vec![
                "begin",
                "update_sql: DELETE FROM `quote` WHERE id = 5",
                "commit",
                "partitioned: DELETE FROM `quote` WHERE true",
            ]
        );
    }

    #[test]
    fn test_configured_partitioned_delete() {
        let recorder = Arc::new(Recorder::default());
        let config = AdapterConfig::new().with_delete_mode(DeleteMode::Partitioned);
        let adapter = SpannerAdapter::with_config(
            Box::new(RecordingConnector {
                recorder: Arc::clone(&recorder),
                rows: Vec::new(),
            }),
            &config,
        );
        assert_eq!(adapter.delete_mode(), DeleteMode::Partitioned);
        assert_eq!(adapter.delete("quote", "").unwrap(), 3);
        assert_eq!(recorder.calls(), vec!["partitioned: DELETE FROM `quote` WHERE true"]);
    }

    #[test]
    fn test_close_is_idempotent_and_terminal() {
        let (adapter, recorder) = adapter();
        adapter.fetch_all("SELECT 1").unwrap();
        adapter.close_connection().unwrap();
        adapter.close_connection().unwrap();

        assert!(adapter.is_closed());
        assert_eq!(recorder.calls().iter().filter(|c| *c == "close").count(), 1);
        assert!(matches!(adapter.query("SELECT 1"), Err(Error::ConnectionClosed)));
        assert!(matches!(
            adapter.insert_one("t", Row::new().with("id", 1)),
            Err(Error::ConnectionClosed)
        ));
    }

    #[test]
    fn test_close_before_connect_never_connects() {
        let (adapter, recorder) = adapter();
        adapter.close_connection().unwrap();
        assert!(matches!(adapter.fetch_row("SELECT 1"), Err(Error::ConnectionClosed)));
        assert_eq!(recorder.connects.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_insert_with_generated_id() {
        let (adapter, recorder) = adapter();
        let (id, _) = adapter
            .insert_with_generated_id("quote", "entity_id", Row::new().with("store_id", 1))
            .unwrap();
        assert!(is_well_formed(&id));
        assert!(recorder.calls().contains(&"insert quote x1".to_string()));
    }

    #[test]
    fn test_date_verbs() {
        let (adapter, _) = adapter();
        let instant = FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 1, 14, 0, 0)
            .unwrap();
        assert_eq!(adapter.encode_date(&instant), "2024-03-01T12:00:00.000Z");
        assert_eq!(adapter.decode_date("").unwrap(), "");
        assert_eq!(
            adapter.convert_datetime("2024-03-01 12:00:00").unwrap().as_deref(),
            Some("2024-03-01T12:00:00.000Z")
        );
        assert_eq!(
            adapter.convert_date("2024-03-01 12:00:00").unwrap().as_deref(),
            Some("2024-03-01")
        );
        assert_eq!(adapter.convert_date("").unwrap(), None);
    }

    #[test]
    fn test_pseudo_random_identity_from_config() {
        let config = AdapterConfig::new().with_identity(IdentityStrategy::PseudoRandom);
        let adapter = SpannerAdapter::from_config(&config);
        assert!(is_well_formed(&adapter.next_id()));
        assert!(!adapter.is_connected());
    }

    #[test]
    fn test_add_cast_is_associated() {
        assert_eq!(
            SpannerAdapter::add_cast("SELECT id FROM t WHERE id = 5", "id", "STRING"),
            "SELECT CAST(id AS STRING) FROM t WHERE CAST(id AS STRING) = 5"
        );
    }
}
