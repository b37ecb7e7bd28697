//! Literal sanitization for a strictly-typed backend.
//!
//! Legacy callers write `WHERE entity_id = '42'` and rely on the database to
//! coerce the string to an integer. The backend refuses that comparison, so
//! quoted literals that are really integers are rewritten to bare numbers
//! before execution.
//!
//! The volatile `RAND()` function has no backend equivalent and would make
//! plans differ between retries, so it is pinned to the constant `1`.

use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Matches either a single-quoted literal or a `RAND()` call.
///
/// Both alternatives are scanned in one pass so that `RAND()` inside a quoted
/// literal is part of the literal and left alone.
static LITERAL_OR_RAND: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"'(?P<literal>[^']*)'|(?P<rand>(?i:\bRAND\s*\(\s*\)))")
        .expect("static regex: literal or RAND() call")
});

/// Rewrites `sql` so its literals type-check against the backend.
///
/// - `'42'` becomes `42` wherever the quoted content is non-empty and all digits
/// - any other quoted literal is left untouched
/// - `RAND()` outside a literal becomes `1`
///
/// The function is total and idempotent; malformed SQL (an unbalanced quote,
/// for instance) passes through with only its well-formed prefix rewritten.
///
/// # Examples
///
/// ```
/// use spanner_bridge::sanitize;
///
/// assert_eq!(sanitize("SELECT * FROM t WHERE id = '42'"), "SELECT * FROM t WHERE id = 42");
/// assert_eq!(sanitize("WHERE name = 'Movable'"), "WHERE name = 'Movable'");
/// assert_eq!(sanitize("ORDER BY RAND()"), "ORDER BY 1");
/// ```
#[must_use]
pub fn sanitize(sql: &str) -> String {
    if !sql.contains('\'') && !contains_rand_call(sql) {
        return sql.to_string();
    }

    LITERAL_OR_RAND
        .replace_all(sql, |caps: &Captures<'_>| {
            if caps.name("rand").is_some() {
                return "1".to_string();
            }
            match caps.name("literal") {
                Some(content) if is_integer_text(content.as_str()) => content.as_str().to_string(),
                _ => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Returns true if the literal content is a non-empty run of ASCII digits.
fn is_integer_text(content: &str) -> bool {
    !content.is_empty() && content.bytes().all(|b| b.is_ascii_digit())
}

fn contains_rand_call(sql: &str) -> bool {
    sql.to_ascii_uppercase().contains("RAND")
}
