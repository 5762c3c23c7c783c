//! Mapping definitions and collected rows.
//!
//! A [`Mapping`] is the declarative half of a connector: four key→directive
//! sections plus an optional resource block, loaded once per connector and
//! reused for every collected row. A [`Row`] is one line of a collected
//! table — ordered string cells, owned by the caller for the duration of a
//! single interpretation and never mutated.
//!
//! Directive semantics live entirely in the interpreter submodules:
//!
//! - [`directive`] — classification with the fixed precedence order
//! - [`resolver`] — column-reference and `$index` resolution
//! - [`evaluators`] — the evaluator library, pure and monitor-bound
//! - [`math`] — guarded arithmetic for the stateful derivations
//! - [`driver`] — the two-phase interpretation driver

pub mod directive;
pub mod driver;
pub mod evaluators;
pub mod math;
pub mod resolver;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Separator used when joining a row's cells into one line of AWK input.
pub const CELL_SEPARATOR: &str = ";";

/// Declarative mapping of one connector source onto monitor fields.
///
/// Immutable once loaded; the interpreter only ever borrows it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Mapping {
    /// Reference to the collected table this mapping interprets
    pub source: Option<String>,
    /// Monitor attributes (key → directive)
    pub attributes: HashMap<String, String>,
    /// Monitor metrics (key → directive)
    pub metrics: HashMap<String, String>,
    /// Conditional-collection expressions (key → directive)
    pub conditional_collection: HashMap<String, String>,
    /// Legacy text parameters (key → directive)
    pub legacy_text_parameters: HashMap<String, String>,
    /// Optional resource block
    pub resource: Option<ResourceMapping>,
}

/// Resource block of a mapping: a type directive plus its own attributes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceMapping {
    /// Directive resolving to the resource type
    #[serde(rename = "type")]
    pub type_directive: String,
    /// Resource attributes (key → directive)
    pub attributes: HashMap<String, String>,
}

/// One line from a collected table: ordered string cells.
///
/// Cells are addressed 1-based from directives (`$1`, `$column(1)` is the
/// first cell), matching how connector authors count columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    cells: Vec<String>,
}

impl Row {
    pub fn new(cells: Vec<String>) -> Self {
        Self { cells }
    }

    /// Split one line of protocol output into a row.
    pub fn from_line(line: &str, separator: char) -> Self {
        Self {
            cells: line.split(separator).map(str::to_string).collect(),
        }
    }

    /// Cell by 1-based column number.
    pub fn cell(&self, column: usize) -> Option<&str> {
        if column == 0 {
            return None;
        }
        self.cells.get(column - 1).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The whole row as one AWK input line, cells joined by
    /// [`CELL_SEPARATOR`].
    pub fn joined(&self) -> String {
        self.cells.join(CELL_SEPARATOR)
    }
}

impl From<Vec<&str>> for Row {
    fn from(cells: Vec<&str>) -> Self {
        Self::new(cells.into_iter().map(str::to_string).collect())
    }
}

/// A mapping entry handed to a monitor-bound evaluator: the output key and
/// the already-resolved directive argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValuePair {
    /// Output key the evaluation result is stored under
    pub key: String,
    /// Resolved directive argument
    pub value: String,
}

impl KeyValuePair {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_cell_is_one_based() {
        let row = Row::from(vec!["a", "b", "c"]);
        assert_eq!(row.cell(1), Some("a"));
        assert_eq!(row.cell(2), Some("b"));
        assert_eq!(row.cell(3), Some("c"));
        assert_eq!(row.cell(0), None);
        assert_eq!(row.cell(4), None);
    }

    #[test]
    fn test_row_from_line() {
        let row = Row::from_line("PS1;on;450", ';');
        assert_eq!(row.len(), 3);
        assert_eq!(row.cell(2), Some("on"));
        assert_eq!(row.joined(), "PS1;on;450");
    }

    #[test]
    fn test_mapping_deserializes_connector_fragment() {
        let fragment = r#"{
            "source": "${source::monitors.fan.collect}",
            "attributes": { "id": "$1", "name": "fan $2" },
            "metrics": { "hw.fan.speed": "$3", "hw.fan.speed_ratio": "percent2ratio($4)" },
            "conditionalCollection": { "hw.fan.speed": "$3" },
            "legacyTextParameters": { "StatusInformation": "$5" },
            "resource": { "type": "fan", "attributes": { "host.name": "$6" } }
        }"#;

        let mapping: Mapping = serde_json::from_str(fragment).expect("fragment should parse");
        assert_eq!(
            mapping.source.as_deref(),
            Some("${source::monitors.fan.collect}")
        );
        assert_eq!(mapping.attributes.len(), 2);
        assert_eq!(
            mapping.metrics.get("hw.fan.speed_ratio").map(String::as_str),
            Some("percent2ratio($4)")
        );
        assert_eq!(mapping.conditional_collection.len(), 1);
        assert_eq!(
            mapping
                .legacy_text_parameters
                .get("StatusInformation")
                .map(String::as_str),
            Some("$5")
        );
        let resource = mapping.resource.expect("resource block");
        assert_eq!(resource.type_directive, "fan");
        assert_eq!(resource.attributes.len(), 1);
    }

    #[test]
    fn test_mapping_sections_default_empty() {
        let mapping: Mapping = serde_json::from_str("{}").expect("empty mapping");
        assert!(mapping.attributes.is_empty());
        assert!(mapping.metrics.is_empty());
        assert!(mapping.conditional_collection.is_empty());
        assert!(mapping.legacy_text_parameters.is_empty());
        assert!(mapping.resource.is_none());
    }
}
