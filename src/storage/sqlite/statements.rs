//! DML text for batched mutations.
//!
//! Every identifier goes through [`quote_identifier`]; every value is bound
//! as a numbered parameter (`?1`, `?2`, ...) in column order.

use crate::Result;
use crate::sql::quote_identifier;

/// `INSERT INTO t (a, b) VALUES (?1, ?2)`.
pub fn insert_sql(table: &str, columns: &[&str]) -> Result<String> {
    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_identifier(table)?,
        quoted_list(columns)?,
        placeholders(1, columns.len())
    ))
}

/// `UPDATE t SET a = ?1 WHERE k = ?2`.
///
/// `set_columns` bind first, then `key_columns`.
pub fn update_sql(table: &str, set_columns: &[&str], key_columns: &[&str]) -> Result<String> {
    let assignments = numbered_equalities(set_columns, 1, ", ")?;
    let predicate = numbered_equalities(key_columns, set_columns.len() + 1, " AND ")?;
    Ok(format!(
        "UPDATE {} SET {assignments} WHERE {predicate}",
        quote_identifier(table)?
    ))
}

/// `INSERT ... ON CONFLICT (k) DO UPDATE SET a = excluded.a`.
///
/// Columns not present in the row keep their stored values.
pub fn upsert_sql(table: &str, columns: &[&str], key_columns: &[&str]) -> Result<String> {
    let insert = insert_sql(table, columns)?;
    let conflict = quoted_list(key_columns)?;
    let updates = columns
        .iter()
        .filter(|c| !key_columns.contains(*c))
        .map(|c| quote_identifier(c).map(|q| format!("{q} = excluded.{q}")))
        .collect::<Result<Vec<_>>>()?;

    if updates.is_empty() {
        return Ok(format!("{insert} ON CONFLICT ({conflict}) DO NOTHING"));
    }
    Ok(format!(
        "{insert} ON CONFLICT ({conflict}) DO UPDATE SET {}",
        updates.join(", ")
    ))
}

fn quoted_list(columns: &[&str]) -> Result<String> {
    Ok(columns
        .iter()
        .map(|c| quote_identifier(c))
        .collect::<Result<Vec<_>>>()?
        .join(", "))
}

fn placeholders(start: usize, count: usize) -> String {
    (start..start + count)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn numbered_equalities(columns: &[&str], start: usize, separator: &str) -> Result<String> {
    Ok(columns
        .iter()
        .enumerate()
        .map(|(offset, c)| quote_identifier(c).map(|q| format!("{q} = ?{}", start + offset)))
        .collect::<Result<Vec<_>>>()?
        .join(separator))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_sql() {
        assert_eq!(
            insert_sql("quote", &["entity_id", "store_id"]).unwrap(),
            "INSERT INTO `quote` (`entity_id`, `store_id`) VALUES (?1, ?2)"
        );
    }

    #[test]
    fn test_update_sql_binds_keys_last() {
        assert_eq!(
            update_sql("quote", &["grand_total", "is_active"], &["entity_id"]).unwrap(),
            "UPDATE `quote` SET `grand_total` = ?1, `is_active` = ?2 WHERE `entity_id` = ?3"
        );
    }

    #[test]
    fn test_upsert_sql() {
        assert_eq!(
            upsert_sql("stock", &["product_id", "qty"], &["product_id"]).unwrap(),
            "INSERT INTO `stock` (`product_id`, `qty`) VALUES (?1, ?2) \
             ON CONFLICT (`product_id`) DO UPDATE SET `qty` = excluded.`qty`"
        );
    }

    #[test]
    fn test_upsert_sql_key_only() {
        assert_eq!(
            upsert_sql("tag", &["name"], &["name"]).unwrap(),
            "INSERT INTO `tag` (`name`) VALUES (?1) ON CONFLICT (`name`) DO NOTHING"
        );
    }

    #[test]
    fn test_rejects_bad_identifier() {
        assert!(insert_sql("", &["a"]).is_err());
        assert!(update_sql("t", &["a`"], &["k"]).is_err());
    }
}
