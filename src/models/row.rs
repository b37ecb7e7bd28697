//! Ordered rows of named column values.

use super::Value;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// An ordered mapping of column name to value.
///
/// Column order is the order in which the backend delivered (or the caller
/// inserted) the columns. Setting a column that already exists replaces its
/// value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    /// Creates an empty row.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            columns: Vec::new(),
        }
    }

    /// Sets a column, returning the row (builder style).
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    /// Sets a column, replacing an existing value with the same name.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.columns.iter_mut().find(|(name, _)| *name == column) {
            Some((_, slot)) => *slot = value,
            None => self.columns.push((column, value)),
        }
    }

    /// Returns the value of a column.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Returns true if the row has the column.
    #[must_use]
    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    /// Returns the first column's value.
    #[must_use]
    pub fn first_value(&self) -> Option<&Value> {
        self.columns.first().map(|(_, value)| value)
    }

    /// Iterates over column names in order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Iterates over values in column order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.columns.iter().map(|(_, value)| value)
    }

    /// Iterates over `(column, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns true if both rows carry the same column names, ignoring order.
    #[must_use]
    pub fn same_columns(&self, other: &Self) -> bool {
        self.len() == other.len() && self.column_names().all(|name| other.contains(name))
    }

    /// Converts the row into a JSON object, preserving column order in the output text.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> crate::Result<String> {
        serde_json::to_string(self).map_err(|e| crate::Error::OperationFailed {
            operation: "serialize_row".to_string(),
            cause: e.to_string(),
        })
    }
}

impl<K, V> FromIterator<(K, V)> for Row
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Self::new();
        for (column, value) in iter {
            row.set(column, value);
        }
        row
    }
}

impl IntoIterator for Row {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.into_iter()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, value) in &self.columns {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_replaces_in_place() {
        let mut row = Row::new().with("entity_id", 1).with("sku", "24-MB01");
        row.set("entity_id", 2);

        assert_eq!(row.len(), 2);
        assert_eq!(row.get("entity_id"), Some(&Value::Int64(2)));
        assert_eq!(row.column_names().collect::<Vec<_>>(), vec!["entity_id", "sku"]);
    }

    #[test]
    fn test_get_missing_column() {
        let row = Row::new().with("sku", "24-MB01");
        assert!(row.get("price").is_none());
        assert!(!row.contains("price"));
    }

    #[test]
    fn test_same_columns_ignores_order() {
        let a = Row::new().with("a", 1).with("b", 2);
        let b = Row::new().with("b", 3).with("a", 4);
        let c = Row::new().with("a", 1).with("c", 2);

        assert!(a.same_columns(&b));
        assert!(!a.same_columns(&c));
        assert!(!a.same_columns(&Row::new().with("a", 1)));
    }

    #[test]
    fn test_to_json_preserves_order() {
        let row: Row = vec![("z", Value::Int64(1)), ("a", Value::from("x"))]
            .into_iter()
            .collect();
        assert_eq!(row.to_json().unwrap(), r#"{"z":1,"a":"x"}"#);
    }

    #[test]
    fn test_first_value() {
        assert!(Row::new().first_value().is_none());
        let row = Row::new().with("count", 3).with("label", "x");
        assert_eq!(row.first_value(), Some(&Value::Int64(3)));
    }

    #[test]
    fn test_iter_pairs_in_column_order() {
        let row = Row::new().with("store_id", 1).with("code", "default");
        let pairs: Vec<_> = row.iter().collect();
        assert_eq!(
            pairs,
            vec![("store_id", &Value::Int64(1)), ("code", &Value::from("default"))]
        );
    }
}
