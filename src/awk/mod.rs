//! AWK script execution seam.
//!
//! A mapping directive may carry a whole AWK script in a
//! `${awk::<script>}` block. The interpreter itself never runs AWK: it
//! unwraps the block, merges the body into a fixed script template (which
//! pins the field separator to the row's cell separator), and hands the
//! script plus the joined row to an [`AwkExecutor`] collaborator. Execution
//! failures are the collaborator's to report and the interpreter's to
//! swallow — a failed script means the key is not reported this cycle,
//! never a pipeline fault.

use crate::mapping::CELL_SEPARATOR;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Script template the unwrapped directive body is merged into. The field
/// separator must match [`CELL_SEPARATOR`], which `Row::joined` uses.
const SCRIPT_TEMPLATE: &str = "BEGIN { FS = \"%SEPARATOR%\" }\n%BODY%";

/// `${awk::<body>}` block, body possibly spanning lines.
static SCRIPT_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^\s*\$\{awk::(.*)\}\s*$").expect("awk block pattern"));

/// Error raised by an AWK executor
#[derive(Error, Debug)]
pub enum AwkError {
    /// Script failed to parse or run
    #[error("AWK execution failed: {0}")]
    Execution(String),

    /// No executor was configured for this interpreter
    #[error("no AWK executor configured")]
    Unavailable,
}

/// External AWK execution collaborator.
///
/// Implementations take a complete script and one input text (the joined
/// row) and return the script's output. They may fail, but must not hang
/// indefinitely — bounding execution is the implementation's contract.
pub trait AwkExecutor {
    fn execute(&self, script: &str, input: &str) -> Result<String, AwkError>;
}

/// Whether `directive` is an AWK script block.
pub fn is_script_block(directive: &str) -> bool {
    SCRIPT_BLOCK.is_match(directive)
}

/// Unwrap the script body out of a `${awk::…}` block.
pub fn script_body(directive: &str) -> Option<&str> {
    SCRIPT_BLOCK
        .captures(directive)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Merge an unwrapped script body into the fixed template.
pub fn build_script(body: &str) -> String {
    SCRIPT_TEMPLATE
        .replace("%SEPARATOR%", CELL_SEPARATOR)
        .replace("%BODY%", body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_block_detection() {
        assert!(is_script_block("${awk::{ print $1 }}"));
        assert!(is_script_block("  ${awk::{ print $2 * 10 }}  "));
        assert!(!is_script_block("percent2ratio($1)"));
        assert!(!is_script_block("$1"));
    }

    #[test]
    fn test_script_body_unwrap() {
        assert_eq!(
            script_body("${awk::{ print $1 }}"),
            Some("{ print $1 }")
        );
        assert_eq!(script_body("literal"), None);
    }

    #[test]
    fn test_script_body_multiline() {
        let directive = "${awk::BEGIN { n = 0 }\n{ n += $3 }\nEND { print n }}";
        let body = script_body(directive).expect("multiline body");
        assert!(body.contains("n += $3"));
        assert!(body.ends_with("END { print n }"));
    }

    #[test]
    fn test_build_script_pins_separator() {
        let script = build_script("{ print $2 }");
        assert_eq!(script, "BEGIN { FS = \";\" }\n{ print $2 }");
    }

    struct FixedOutput(&'static str);

    impl AwkExecutor for FixedOutput {
        fn execute(&self, _script: &str, _input: &str) -> Result<String, AwkError> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn test_executor_trait_object() {
        let executor: &dyn AwkExecutor = &FixedOutput("42");
        assert_eq!(
            executor.execute("{ print }", "a;b").expect("fixed output"),
            "42"
        );
    }
}
