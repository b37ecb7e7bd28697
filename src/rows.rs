//! Materializing row cursors into fetch results.
//!
//! Cursors are consumed by value, so a result set can only be materialized
//! once.

use crate::models::{Row, Value};
use crate::storage::RowCursor;
use crate::Result;

/// Drains the cursor into a vector, preserving order.
///
/// # Errors
///
/// Returns the first row error the cursor yields.
pub fn collect_all(cursor: RowCursor) -> Result<Vec<Row>> {
    cursor.collect()
}

/// Returns the first row, or `None` for an empty cursor.
///
/// Rows after the first are never pulled from the cursor.
///
/// # Errors
///
/// Returns the error if producing the first row fails.
pub fn collect_first(mut cursor: RowCursor) -> Result<Option<Row>> {
    cursor.next().transpose()
}

/// Returns the first column of the first row.
///
/// # Errors
///
/// Returns the error if producing the first row fails.
pub fn collect_scalar(cursor: RowCursor) -> Result<Option<Value>> {
    Ok(collect_first(cursor)?.and_then(|row| row.first_value().cloned()))
}
