//! # Spanner Bridge
//!
//! Runs SQL written for a forgiving, implicitly-coercing dialect against a
//! strictly-typed, transactional Spanner-style backend.
//!
//! The bridge rewrites SQL text so literal types match the backend's columns,
//! wraps every mutation in an explicit atomic transaction, and turns a
//! streaming row cursor into the fetch-one/fetch-all results legacy callers
//! expect.
//!
//! ## Features
//!
//! - Literal sanitization (`'42'` becomes `42`, `RAND()` becomes `1`)
//! - Atomic single-table, multi-row and multi-table batched mutations
//! - Atomic or partitioned deletes, chosen explicitly
//! - Canonical UTC date wire format (`2024-03-01T12:00:00.000Z`)
//! - Adapter-side UUID identifiers in place of auto-increment keys
//! - Pluggable backend contract with a bundled `SQLite` `STRICT`-table backend
//!
//! ## Example
//!
//! ```rust,ignore
//! use spanner_bridge::{Row, SpannerAdapter};
//! use spanner_bridge::storage::SqliteConnector;
//!
//! let adapter = SpannerAdapter::connect(Box::new(SqliteConnector::in_memory()))?;
//! adapter.raw_query("CREATE TABLE stores (id INTEGER PRIMARY KEY, code TEXT NOT NULL) STRICT")?;
//! adapter.insert_one("stores", Row::new().with("id", 1).with("code", "default"))?;
//! let row = adapter.fetch_row("SELECT code FROM stores WHERE id = '1'")?;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod adapter;
pub mod config;
pub mod dates;
pub mod identity;
pub mod models;
pub mod observability;
pub mod rows;
pub mod sql;
pub mod storage;
pub mod transaction;

// Re-exports for convenience
pub use adapter::{Fetched, SpannerAdapter};
pub use config::{AdapterConfig, DeleteMode};
pub use identity::{IdentityGenerator, IdentityStrategy};
pub use models::{Row, Value};
pub use sql::{add_cast, sanitize};
pub use storage::{Backend, CommitResult, Connector, RowCursor, Transaction};
pub use transaction::{
    BatchMutation, DeleteOutcome, MutationKind, TransactionCoordinator, TransactionUnit,
};

/// Error type for adapter operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Bad identifiers, unparseable dates, ragged batches |
/// | `Connection` | The connector cannot open the database |
/// | `ConnectionClosed` | Any operation after `close_connection` |
/// | `TransactionAborted` | The backend rejects or aborts a transaction unit |
/// | `Alignment` | `insert_across_tables` gets sequences of different lengths |
/// | `OperationFailed` | Query execution or partitioned updates fail in the backend |
///
/// Sanitization never fails, and "no rows" is reported as `None`, not as an error.
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - A table or column name is empty or contains a backtick
    /// - A date string cannot be parsed
    /// - A batch is empty or its rows disagree on columns
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The backend could not be reached.
    #[error("connection failed: {cause}")]
    Connection {
        /// The underlying cause.
        cause: String,
    },

    /// The adapter's connection was closed; a new adapter is required.
    #[error("connection is closed")]
    ConnectionClosed,

    /// The backend rejected or aborted a transaction unit. Nothing was applied.
    ///
    /// Raised when:
    /// - A constraint or type check fails inside the transaction
    /// - An updated row does not exist
    /// - The transaction body returns without committing, or commits twice
    #[error("transaction '{operation}' aborted: {cause}")]
    TransactionAborted {
        /// The operation whose transaction aborted.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// Tables and row sets passed to a multi-table insert have different lengths.
    #[error("{tables} tables but {row_sets} row sets")]
    Alignment {
        /// Number of tables supplied.
        tables: usize,
        /// Number of row sets supplied.
        row_sets: usize,
    },

    /// An operation failed.
    ///
    /// Raised when:
    /// - The backend rejects a query
    /// - A partitioned update fails
    /// - Config or log files cannot be read
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

/// Result type alias for adapter operations.
pub type Result<T> = std::result::Result<T, Error>;
