//! Terms and statements.
//!
//! A statement is a predicate applied to an ordered list of terms. Terms are
//! either constants or variables; variables are written `?name` in text.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A single argument of a statement.
///
/// # Examples
///
/// ```
/// use kyrotms::Term;
///
/// let x = Term::variable("x");
/// let cube = Term::constant("cube");
///
/// assert!(x.is_variable());
/// assert!(cube.is_constant());
/// assert_eq!(x.to_string(), "?x");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", content = "name", rename_all = "snake_case")]
pub enum Term {
    /// A constant symbol such as `cube`.
    Constant(String),
    /// A variable, stored without its `?` sigil.
    Variable(String),
}

impl Term {
    /// Creates a constant term.
    #[must_use]
    pub fn constant(name: impl Into<String>) -> Self {
        Self::Constant(name.into())
    }

    /// Creates a variable term. The name is stored without the `?` sigil.
    #[must_use]
    pub fn variable(name: impl Into<String>) -> Self {
        let name = name.into();
        match name.strip_prefix('?') {
            Some(stripped) => Self::Variable(stripped.to_string()),
            None => Self::Variable(name),
        }
    }

    /// Parses a single token: `?name` is a variable, anything else a constant.
    pub fn parse(token: &str) -> Result<Self, ValidationError> {
        validate_symbol(token)?;
        match token.strip_prefix('?') {
            Some("") => Err(ValidationError::InvalidSymbol {
                symbol: token.to_string(),
                reason: "variable name is empty".to_string(),
            }),
            Some(name) => Ok(Self::Variable(name.to_string())),
            None => Ok(Self::Constant(token.to_string())),
        }
    }

    /// Returns true for constants.
    #[must_use]
    pub const fn is_constant(&self) -> bool {
        matches!(self, Self::Constant(_))
    }

    /// Returns true for variables.
    #[must_use]
    pub const fn is_variable(&self) -> bool {
        matches!(self, Self::Variable(_))
    }

    /// Returns the bare name of the term.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Constant(name) | Self::Variable(name) => name,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(name) => write!(f, "{name}"),
            Self::Variable(name) => write!(f, "?{name}"),
        }
    }
}

impl From<&str> for Term {
    fn from(token: &str) -> Self {
        match token.strip_prefix('?') {
            Some(name) => Self::Variable(name.to_string()),
            None => Self::Constant(token.to_string()),
        }
    }
}

fn validate_symbol(symbol: &str) -> Result<(), ValidationError> {
    if symbol.is_empty() {
        return Err(ValidationError::InvalidSymbol {
            symbol: String::new(),
            reason: "symbol is empty".to_string(),
        });
    }
    if let Some(c) = symbol
        .chars()
        .find(|c| c.is_whitespace() || matches!(c, '(' | ')'))
    {
        return Err(ValidationError::InvalidSymbol {
            symbol: symbol.to_string(),
            reason: format!("contains reserved character {c:?}"),
        });
    }
    Ok(())
}

/// An atomic predicate expression, e.g. `(on ?x table)`.
///
/// Statements compare and hash structurally; the knowledge base uses them as
/// lookup keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Statement {
    /// Predicate symbol; never a variable.
    pub predicate: String,
    /// Arguments, in order.
    pub terms: Vec<Term>,
}

impl Statement {
    /// Creates a statement, validating the predicate and every term.
    pub fn new(predicate: impl Into<String>, terms: Vec<Term>) -> Result<Self, ValidationError> {
        let predicate = predicate.into();
        if predicate.trim().is_empty() {
            return Err(ValidationError::EmptyPredicate);
        }
        validate_symbol(&predicate)?;
        if predicate.starts_with('?') {
            return Err(ValidationError::InvalidSymbol {
                symbol: predicate,
                reason: "predicate cannot be a variable".to_string(),
            });
        }
        for term in &terms {
            validate_symbol(term.name())?;
        }
        Ok(Self { predicate, terms })
    }

    /// Shorthand for tests and literals: `Statement::of("on", &["?x", "table"])`.
    ///
    /// Tokens starting with `?` become variables.
    pub fn of(predicate: &str, tokens: &[&str]) -> Result<Self, ValidationError> {
        let terms = tokens.iter().map(|t| Term::parse(t)).collect::<Result<_, _>>()?;
        Self::new(predicate, terms)
    }

    /// Number of terms.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.terms.len()
    }

    /// Returns true if no term is a variable.
    #[must_use]
    pub fn is_ground(&self) -> bool {
        self.terms.iter().all(Term::is_constant)
    }

    /// Iterates the variables in order of appearance (duplicates included).
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().filter_map(|t| match t {
            Term::Variable(name) => Some(name.as_str()),
            Term::Constant(_) => None,
        })
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}", self.predicate)?;
        for term in &self.terms {
            write!(f, " {term}")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn term_parse_distinguishes_variables() {
        assert_eq!(Term::parse("?x").unwrap(), Term::variable("x"));
        assert_eq!(Term::parse("cube").unwrap(), Term::constant("cube"));
        assert!(Term::parse("?").is_err());
        assert!(Term::parse("a b").is_err());
    }

    #[test]
    fn variable_constructor_strips_sigil() {
        assert_eq!(Term::variable("?y"), Term::variable("y"));
        assert_eq!(Term::variable("?y").name(), "y");
    }

    #[test]
    fn statement_display() {
        let s = Statement::of("on", &["?x", "table"]).unwrap();
        assert_eq!(s.to_string(), "(on ?x table)");
        assert_eq!(s.arity(), 2);
        assert!(!s.is_ground());
        assert_eq!(s.variables().collect::<Vec<_>>(), vec!["x"]);
    }

    #[test]
    fn statement_rejects_bad_predicates() {
        assert_eq!(
            Statement::new("  ", vec![]).unwrap_err(),
            ValidationError::EmptyPredicate
        );
        assert!(Statement::new("?p", vec![]).is_err());
        assert!(Statement::new("a(b", vec![]).is_err());
    }

    #[test]
    fn statements_compare_structurally() {
        let a = Statement::of("color", &["cube", "red"]).unwrap();
        let b = Statement::of("color", &["cube", "red"]).unwrap();
        let c = Statement::of("color", &["cube", "blue"]).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn term_serde_shape() {
        let json = serde_json::to_value(Term::variable("x")).unwrap();
        assert_eq!(json, serde_json::json!({"type": "variable", "name": "x"}));
    }
}
