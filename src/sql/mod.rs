//! SQL text rewriting.
//!
//! Nothing in this module parses SQL. Every helper is a literal-level text
//! transform:
//! - [`sanitize`]: quoted integers become bare integers, `RAND()` becomes `1`
//! - [`add_cast`]: wraps every occurrence of a column name in `CAST(.. AS ..)`
//! - [`quote_identifier`]: backtick-quotes a table or column name
//! - [`unquote`]: reverses backslash escapes in a raw string value

mod sanitize;

pub use sanitize::sanitize;

use crate::{Error, Result};

/// Wraps every occurrence of `column` in `sql` with `CAST(column AS ty)`.
///
/// This is plain substring replacement: if `column` also appears inside another
/// identifier or a string literal, that occurrence is rewritten too. Callers
/// must pick a `column` that is not a substring of anything else in the query.
/// An empty `column` leaves `sql` unchanged.
///
/// # Examples
///
/// ```
/// use spanner_bridge::add_cast;
///
/// assert_eq!(
///     add_cast("SELECT id FROM t WHERE id = 5", "id", "STRING"),
///     "SELECT CAST(id AS STRING) FROM t WHERE CAST(id AS STRING) = 5",
/// );
/// ```
#[must_use]
pub fn add_cast(sql: &str, column: &str, ty: &str) -> String {
    if column.is_empty() {
        return sql.to_string();
    }
    sql.replace(column, &format!("CAST({column} AS {ty})"))
}

/// Quotes a table or column name with backticks.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the name is empty or contains a backtick.
///
/// # Examples
///
/// ```
/// use spanner_bridge::sql::quote_identifier;
///
/// assert_eq!(quote_identifier("sales_order").unwrap(), "`sales_order`");
/// assert!(quote_identifier("bad`name").is_err());
/// ```
pub fn quote_identifier(name: &str) -> Result<String> {
    if name.trim().is_empty() {
        return Err(Error::InvalidInput("identifier must not be empty".to_string()));
    }
    if name.contains('`') {
        return Err(Error::InvalidInput(format!(
            "identifier must not contain a backtick: {name}"
        )));
    }
    Ok(format!("`{name}`"))
}

/// Reverses backslash escapes in a raw quoted string.
///
/// Recognised sequences: `\000` (NUL), `\n`, `\r`, `\\`, `\'`, `\"`, and
/// `\032` (SUB). Anything else, including a trailing lone backslash, is kept
/// as written.
///
/// # Examples
///
/// ```
/// use spanner_bridge::sql::unquote;
///
/// assert_eq!(unquote(r"it\'s"), "it's");
/// assert_eq!(unquote(r"a\nb"), "a\nb");
/// ```
#[must_use]
pub fn unquote(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(pos) = rest.find('\\') {
        result.push_str(&rest[..pos]);
        let escape = &rest[pos..];
        let (replacement, consumed) = if escape.starts_with("\\000") {
            ('\0', 4)
        } else if escape.starts_with("\\032") {
            ('\u{1a}', 4)
        } else {
            match escape.as_bytes().get(1) {
                Some(b'n') => ('\n', 2),
                Some(b'r') => ('\r', 2),
                Some(b'\\') => ('\\', 2),
                Some(b'\'') => ('\'', 2),
                Some(b'"') => ('"', 2),
                _ => ('\\', 1),
            }
        };
        result.push(replacement);
        rest = &escape[consumed..];
    }

    result.push_str(rest);
    result
}
