//! Row cursors and commit results.

use crate::Result;
use crate::models::Row;
use chrono::{DateTime, Utc};
use std::fmt;

/// A one-shot, finite sequence of rows returned by a query.
///
/// A cursor is consumed by iterating it. It cannot be cloned or rewound, so
/// each query result is materialized exactly once; see [`crate::rows`].
/// Rows are `Result`s because a streaming backend may fail part-way through.
pub struct RowCursor {
    rows: Box<dyn Iterator<Item = Result<Row>> + Send>,
}

impl RowCursor {
    /// Wraps a row iterator.
    pub fn new<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = Result<Row>>,
        I::IntoIter: Send + 'static,
    {
        Self {
            rows: Box::new(rows.into_iter()),
        }
    }

    /// A cursor over already-fetched rows.
    #[must_use]
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self::new(rows.into_iter().map(Ok))
    }

    /// A cursor with no rows.
    #[must_use]
    pub fn empty() -> Self {
        Self::from_rows(Vec::new())
    }
}

impl Iterator for RowCursor {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows.next()
    }
}

impl fmt::Debug for RowCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowCursor").finish_non_exhaustive()
    }
}

/// Outcome of a committed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitResult {
    timestamp: DateTime<Utc>,
}

impl CommitResult {
    /// Creates a commit result with the backend-assigned timestamp.
    #[must_use]
    pub const fn new(timestamp: DateTime<Utc>) -> Self {
        Self { timestamp }
    }

    /// The commit timestamp.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
