//! Storage layer abstraction.
//!
//! The adapter talks to a database only through the traits in [`traits`]:
//! - **Backend**: one-shot reads, read-write transactions, partitioned DML
//! - **Transaction**: buffered batch mutations inside one atomic unit
//! - **Connector**: opens a backend lazily on first use
//!
//! [`sqlite`] provides the bundled embedded implementation.

// Allow significant_drop_tightening - the connection lock spans each whole
// statement or transaction.
#![allow(clippy::significant_drop_tightening)]

pub mod sqlite;
pub mod traits;

pub use sqlite::{SqliteBackend, SqliteConnector};
pub use traits::{Backend, CommitResult, Connector, RowCursor, Transaction, TransactionBody};
