//! Backend contract.

mod backend;
mod cursor;

pub use backend::{Backend, Connector, Transaction, TransactionBody};
pub use cursor::{CommitResult, RowCursor};
