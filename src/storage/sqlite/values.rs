//! Conversion between adapter values and `SQLite` values.

use crate::dates;
use crate::models::{Row, Value};
use rusqlite::ToSql;
use rusqlite::types::{ToSqlOutput, ValueRef};

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Self::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            Self::Bool(b) => ToSqlOutput::from(i64::from(*b)),
            Self::Int64(i) => ToSqlOutput::from(*i),
            Self::Float64(f) => ToSqlOutput::from(*f),
            Self::String(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Self::Bytes(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
            Self::Timestamp(ts) => ToSqlOutput::from(dates::encode(ts)),
        })
    }
}

/// Converts a borrowed `SQLite` value into an owned adapter value.
///
/// Text that is not valid UTF-8 is replaced lossily.
pub fn value_from_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int64(i),
        ValueRef::Real(f) => Value::Float64(f),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Bytes(bytes.to_vec()),
    }
}

/// Reads every column of a result row, in statement column order.
pub fn read_row(row: &rusqlite::Row<'_>, columns: &[String]) -> rusqlite::Result<Row> {
    let mut out = Row::new();
    for (idx, name) in columns.iter().enumerate() {
        out.set(name.clone(), value_from_ref(row.get_ref(idx)?));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rusqlite::Connection;

    fn roundtrip(value: &Value) -> Value {
        let conn = Connection::open_in_memory().unwrap();
        conn.query_row("SELECT ?1", [value], |row| Ok(value_from_ref(row.get_ref(0)?)))
            .unwrap()
    }

    #[test]
    fn test_scalars_bind_natively() {
        assert_eq!(roundtrip(&Value::Null), Value::Null);
        assert_eq!(roundtrip(&Value::Int64(-9)), Value::Int64(-9));
        assert_eq!(roundtrip(&Value::Float64(2.5)), Value::Float64(2.5));
        assert_eq!(roundtrip(&Value::from("sku")), Value::from("sku"));
        assert_eq!(roundtrip(&Value::Bytes(vec![0, 1])), Value::Bytes(vec![0, 1]));
    }

    #[test]
    fn test_bool_binds_as_integer() {
        assert_eq!(roundtrip(&Value::Bool(true)), Value::Int64(1));
    }

    #[test]
    fn test_timestamp_binds_as_wire_text() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(
            roundtrip(&Value::Timestamp(ts)),
            Value::from("2024-03-01T12:00:00.000Z")
        );
    }
}
