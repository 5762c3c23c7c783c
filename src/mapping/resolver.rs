//! Value resolution for directive arguments.
//!
//! A directive argument is either a positional column reference into the
//! current row — `$column(N)` or the bare `$N` form — or a literal passed
//! through unchanged. Out-of-range references resolve to the empty string
//! with a warning; they never abort the interpretation.

use crate::mapping::Row;
use regex::Regex;
use std::sync::LazyLock;

/// Token replaced by the caller-supplied auto-increment counter.
pub const INDEX_TOKEN: &str = "$index";

/// Whole-string column reference: `$column(N)` or `$N`.
static COLUMN_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\$(?:column\((\d+)\)|(\d+))\s*$").expect("column reference pattern")
});

/// Embedded column reference: any `$N` occurrence inside text.
static EMBEDDED_COLUMN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$(\d+)").expect("embedded column pattern"));

/// Column number if `directive` is exactly a column reference.
pub fn column_index(directive: &str) -> Option<usize> {
    let caps = COLUMN_REFERENCE.captures(directive)?;
    caps.get(1)
        .or_else(|| caps.get(2))?
        .as_str()
        .parse()
        .ok()
}

/// Resolve one directive argument: column reference → row cell, anything
/// else → literal pass-through.
pub fn resolve_argument(argument: &str, row: &Row) -> String {
    match column_index(argument) {
        Some(column) => cell_or_empty(row, column, argument),
        None => argument.to_string(),
    }
}

/// Whether `text` contains at least one embedded `$N` reference.
pub fn contains_column_reference(text: &str) -> bool {
    EMBEDDED_COLUMN.is_match(text)
}

/// Replace every embedded `$N` in `text` with the matching row cell.
pub fn replace_column_references(text: &str, row: &Row) -> String {
    EMBEDDED_COLUMN
        .replace_all(text, |caps: &regex::Captures<'_>| {
            match caps[1].parse::<usize>() {
                Ok(column) => cell_or_empty(row, column, text),
                Err(_) => String::new(),
            }
        })
        .into_owned()
}

/// Replace the `$index` token with the auto-increment counter value.
pub fn replace_index(text: &str, index: usize) -> String {
    text.replace(INDEX_TOKEN, &index.to_string())
}

fn cell_or_empty(row: &Row, column: usize, directive: &str) -> String {
    match row.cell(column) {
        Some(cell) => cell.to_string(),
        None => {
            log::warn!(
                "column reference ${} in '{}' is out of range for a row of {} cells",
                column,
                directive,
                row.len()
            );
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> Row {
        Row::from(vec!["a", "b", "c"])
    }

    #[test]
    fn test_column_index_forms() {
        assert_eq!(column_index("$column(2)"), Some(2));
        assert_eq!(column_index("$2"), Some(2));
        assert_eq!(column_index("  $column(10)  "), Some(10));
        assert_eq!(column_index("pre-$1"), None);
        assert_eq!(column_index("$column(x)"), None);
        assert_eq!(column_index("literal"), None);
    }

    #[test]
    fn test_resolve_argument_column() {
        assert_eq!(resolve_argument("$column(2)", &row()), "b");
        assert_eq!(resolve_argument("$3", &row()), "c");
    }

    #[test]
    fn test_resolve_argument_literal_passthrough() {
        assert_eq!(resolve_argument("fan", &row()), "fan");
        assert_eq!(resolve_argument("42", &row()), "42");
    }

    #[test]
    fn test_resolve_argument_out_of_range_is_empty() {
        assert_eq!(resolve_argument("$column(9)", &row()), "");
        assert_eq!(resolve_argument("$0", &row()), "");
    }

    #[test]
    fn test_replace_embedded_references() {
        assert_eq!(replace_column_references("pre-$1-post", &row()), "pre-a-post");
        assert_eq!(replace_column_references("$1/$2/$3", &row()), "a/b/c");
        // Maximal digit run: $12 is column 12, not column 1 followed by "2".
        assert_eq!(replace_column_references("x$12x", &row()), "xx");
    }

    #[test]
    fn test_replace_index() {
        assert_eq!(replace_index("enclosure $index", 7), "enclosure 7");
        assert_eq!(replace_index("no token", 7), "no token");
    }

    #[test]
    fn test_contains_column_reference() {
        assert!(contains_column_reference("pre-$1-post"));
        assert!(!contains_column_reference("$index"));
        assert!(!contains_column_reference("plain text"));
    }
}
