//! Error types for kyrotms.
//!
//! All errors are strongly typed using thiserror. None of them are fatal:
//! every operation that returns one leaves the knowledge base untouched.

use thiserror::Error;

/// Validation errors raised while constructing statements and rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Rule must have at least one premise")]
    EmptyPremises,

    #[error("Predicate cannot be empty")]
    EmptyPredicate,

    #[error("Invalid symbol '{symbol}': {reason}")]
    InvalidSymbol {
        symbol: String,
        reason: String,
    },
}

/// Errors reported by `ask`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("Invalid ask: {rule} is a rule, not a fact")]
    NotAFact {
        rule: String,
    },
}

/// Errors reported by `retract`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetractionError {
    #[error("Cannot retract a rule: {rule}")]
    RuleNotRetractable {
        rule: String,
    },

    #[error("Cannot retract {fact}: still supported by {support_count} derivation(s)")]
    StillSupported {
        fact: String,
        support_count: usize,
    },
}

/// Errors produced by the text reader.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Parse error on line {line}: {reason}")]
pub struct ParseError {
    /// 1-based line number (1 for single-item parses).
    pub line: usize,
    /// What went wrong.
    pub reason: String,
}

impl ParseError {
    pub(crate) fn new(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line,
            reason: reason.into(),
        }
    }
}

/// Top-level error type for kyrotms.
#[derive(Debug, Error)]
pub enum KbError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    #[error("Retraction error: {0}")]
    Retraction(#[from] RetractionError),

    #[error("{0}")]
    Parse(#[from] ParseError),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl KbError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a query error.
    #[must_use]
    pub const fn is_query(&self) -> bool {
        matches!(self, Self::Query(_))
    }

    /// Returns true if this is a retraction error.
    #[must_use]
    pub const fn is_retraction(&self) -> bool {
        matches!(self, Self::Retraction(_))
    }

    /// Returns true if this is a parse error.
    #[must_use]
    pub const fn is_parse(&self) -> bool {
        matches!(self, Self::Parse(_))
    }

    /// Returns true if this is an internal error.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }
}

/// Result type alias for kyrotms operations.
pub type KbResult<T> = Result<T, KbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_messages() {
        let msg = format!("{}", ValidationError::EmptyPremises);
        assert!(msg.contains("at least one premise"));

        let err = ValidationError::InvalidSymbol {
            symbol: "a b".to_string(),
            reason: "contains whitespace".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("a b"));
        assert!(msg.contains("whitespace"));
    }

    #[test]
    fn test_retraction_error_still_supported() {
        let err = RetractionError::StillSupported {
            fact: "(c 1)".to_string(),
            support_count: 2,
        };
        let msg = format!("{err}");
        assert!(msg.contains("(c 1)"));
        assert!(msg.contains('2'));
    }

    #[test]
    fn test_parse_error_carries_line() {
        let err = ParseError::new(7, "unbalanced parentheses");
        let msg = format!("{err}");
        assert!(msg.contains("line 7"));
        assert!(msg.contains("unbalanced"));
    }

    #[test]
    fn test_kb_error_from_variants() {
        let err: KbError = ValidationError::EmptyPredicate.into();
        assert!(err.is_validation());

        let err: KbError = QueryError::NotAFact {
            rule: "((a ?x)) -> (b ?x)".to_string(),
        }
        .into();
        assert!(err.is_query());

        let err: KbError = RetractionError::RuleNotRetractable {
            rule: "r".to_string(),
        }
        .into();
        assert!(err.is_retraction());

        let err: KbError = ParseError::new(1, "empty").into();
        assert!(err.is_parse());
    }

    #[test]
    fn test_kb_error_internal() {
        let err = KbError::internal("dangling support pair");
        assert!(err.is_internal());
        assert!(format!("{err}").contains("dangling support pair"));
    }
}
