//! Data models shared by the adapter and its backends.
//!
//! Rows travel in both directions: as query results read from a cursor and as
//! mutation payloads handed to batched inserts and updates.

mod row;
mod value;

pub use row::Row;
pub use value::Value;
