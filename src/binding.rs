//! Variable bindings, unification and instantiation.
//!
//! This is the pattern-matching layer the knowledge base consumes. It is pure
//! and stateless: `unify` tests whether two statements match and produces the
//! variable bindings that make them equal, `instantiate` substitutes bound
//! variables into a statement.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::fact::{FactId, Item};
use crate::term::{Statement, Term};

/// One variable bound to a term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    /// Variable name, without the `?` sigil.
    pub variable: String,
    /// Term the variable is bound to.
    pub value: Term,
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{} : {}", self.variable, self.value)
    }
}

/// Ordered set of variable bindings produced by a successful unification.
///
/// An empty `Bindings` is still a successful match (two ground statements
/// that are equal).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bindings {
    bindings: Vec<Binding>,
}

impl Bindings {
    /// Creates an empty binding set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value bound to `variable`, if any.
    #[must_use]
    pub fn bound_to(&self, variable: &str) -> Option<&Term> {
        self.bindings
            .iter()
            .find(|b| b.variable == variable)
            .map(|b| &b.value)
    }

    /// Binds `variable` to `value`, or checks an existing binding.
    ///
    /// Returns false if the variable is already bound to something else.
    pub fn test_and_bind(&mut self, variable: &str, value: &Term) -> bool {
        if let Some(bound) = self.bound_to(variable) {
            return bound == value;
        }
        self.bindings.push(Binding {
            variable: variable.to_string(),
            value: value.clone(),
        });
        true
    }

    /// Number of bound variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns true if no variable is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bindings in the order they were made.
    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.iter()
    }
}

impl fmt::Display for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, binding) in self.bindings.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{binding}")?;
        }
        Ok(())
    }
}

/// Unifies two statements.
///
/// Predicates and arities must agree. Terms are matched left to right: a
/// variable on the left is bound to the right-hand term, otherwise a variable
/// on the right is bound to the left-hand term, otherwise both constants must
/// be equal.
///
/// # Examples
///
/// ```
/// use kyrotms::{unify, Statement, Term};
///
/// let pattern = Statement::of("on", &["?x", "table"]).unwrap();
/// let fact = Statement::of("on", &["cube", "table"]).unwrap();
///
/// let bindings = unify(&pattern, &fact).unwrap();
/// assert_eq!(bindings.bound_to("x"), Some(&Term::constant("cube")));
/// ```
#[must_use]
pub fn unify(left: &Statement, right: &Statement) -> Option<Bindings> {
    if left.predicate != right.predicate || left.arity() != right.arity() {
        return None;
    }

    let mut bindings = Bindings::new();
    for (l, r) in left.terms.iter().zip(&right.terms) {
        let matched = match (l, r) {
            (Term::Variable(name), _) => bindings.test_and_bind(name, r),
            (_, Term::Variable(name)) => bindings.test_and_bind(name, l),
            (Term::Constant(a), Term::Constant(b)) => a == b,
        };
        if !matched {
            return None;
        }
    }
    Some(bindings)
}

/// Substitutes bound variables into `statement`; unbound variables are kept.
#[must_use]
pub fn instantiate(statement: &Statement, bindings: &Bindings) -> Statement {
    let terms = statement
        .terms
        .iter()
        .map(|term| match term {
            Term::Variable(name) => bindings.bound_to(name).cloned().unwrap_or_else(|| term.clone()),
            Term::Constant(_) => term.clone(),
        })
        .collect();
    Statement {
        predicate: statement.predicate.clone(),
        terms,
    }
}

/// Returns true if `item` can be used as an `ask` query.
///
/// Only facts are valid queries; rules are rejected.
#[must_use]
pub fn is_query(item: &Item) -> bool {
    matches!(item, Item::Fact(_))
}

/// One answer to an `ask`: the bindings and the facts that produced them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    /// Variable assignments for the query.
    pub bindings: Bindings,
    /// Matched facts.
    pub facts: Vec<FactId>,
}

/// Ordered answers returned by `ask`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListOfBindings {
    answers: Vec<Answer>,
}

impl ListOfBindings {
    /// Creates an empty answer list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one successful unification.
    pub fn add_bindings(&mut self, bindings: Bindings, facts: Vec<FactId>) {
        self.answers.push(Answer { bindings, facts });
    }

    /// Number of answers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.answers.len()
    }

    /// Returns true if nothing matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// Answers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Answer> {
        self.answers.iter()
    }

    /// Returns true if some answer was produced by `fact`.
    #[must_use]
    pub fn references(&self, fact: FactId) -> bool {
        self.answers.iter().any(|a| a.facts.contains(&fact))
    }
}

impl<'a> IntoIterator for &'a ListOfBindings {
    type Item = &'a Answer;
    type IntoIter = std::slice::Iter<'a, Answer>;

    fn into_iter(self) -> Self::IntoIter {
        self.answers.iter()
    }
}

impl fmt::Display for ListOfBindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for answer in &self.answers {
            writeln!(f, "{}", answer.bindings)?;
        }
        Ok(())
    }
}
