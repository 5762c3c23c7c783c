//! Error types for the mapping engine

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Main error type for the mapping engine.
///
/// Almost every failure inside the interpreter is non-fatal by contract:
/// the affected key is omitted from the current cycle and the condition is
/// logged. The variants below are the exceptions that callers must see.
#[derive(Error, Debug)]
pub enum EngineError {
    /// `lookup` directive called with the wrong number of arguments.
    /// This is a connector-authoring defect, not a runtime condition.
    #[error("lookup expects exactly 4 arguments, got {found}: {directive}")]
    LookupArity {
        /// Number of arguments actually present
        found: usize,
        /// The offending directive text
        directive: String,
    },

    /// Other error
    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_arity_display() {
        let err = EngineError::LookupArity {
            found: 3,
            directive: "lookup(fan, id, serial)".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "lookup expects exactly 4 arguments, got 3: lookup(fan, id, serial)"
        );
    }

    #[test]
    fn test_other_display() {
        let err = EngineError::Other("misc failure".to_string());
        assert_eq!(err.to_string(), "misc failure");
    }
}
