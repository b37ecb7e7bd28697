//! Embedded `SQLite` backend.
//!
//! ## Module Structure
//!
//! - `connection`: lock acquisition and connection configuration
//! - `values`: conversion between [`Value`](crate::models::Value) and `SQLite` values
//! - `statements`: DML text for batched mutations
//! - `transaction`: the read-write [`Transaction`](crate::storage::Transaction) handle
//! - `backend`: [`SqliteBackend`] and its [`SqliteConnector`]

mod backend;
mod connection;
mod statements;
mod transaction;
mod values;

pub use backend::{SqliteBackend, SqliteConnector};
pub use connection::{BUSY_TIMEOUT, acquire_lock, configure_connection};
pub use transaction::SqliteTransaction;
pub use values::value_from_ref;
