//! Facts, rules and their support records.
//!
//! Every fact and rule carries its provenance: whether the user asserted it,
//! which `(fact, rule)` premise pairs derived it, and which items it helped
//! derive in turn. The knowledge base keeps these links bidirectionally
//! consistent so that retraction can walk the support graph.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::term::Statement;

/// Stable handle of a fact inside a knowledge base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactId(uuid::Uuid);

impl FactId {
    /// Creates a new random fact ID.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for FactId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable handle of a rule inside a knowledge base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(uuid::Uuid);

impl RuleId {
    /// Creates a new random rule ID.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for RuleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle of either kind of knowledge base member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ItemId {
    /// A stored fact.
    Fact(FactId),
    /// A stored rule.
    Rule(RuleId),
}

impl ItemId {
    /// The fact id, if this names a fact.
    #[must_use]
    pub const fn as_fact(self) -> Option<FactId> {
        match self {
            Self::Fact(id) => Some(id),
            Self::Rule(_) => None,
        }
    }

    /// The rule id, if this names a rule.
    #[must_use]
    pub const fn as_rule(self) -> Option<RuleId> {
        match self {
            Self::Rule(id) => Some(id),
            Self::Fact(_) => None,
        }
    }
}

/// One derivation path: the premise fact and premise rule that produced an item.
///
/// Facts are derived from `(fact, rule)` and carried rules from
/// `(rule, fact)`; both premises are named here, so no positional order is
/// needed to tell them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SupportPair {
    /// Premise fact.
    pub fact: FactId,
    /// Premise rule.
    pub rule: RuleId,
}

impl SupportPair {
    /// Pairs a premise fact with a premise rule.
    #[must_use]
    pub const fn new(fact: FactId, rule: RuleId) -> Self {
        Self { fact, rule }
    }

    /// Returns true if `premise` is one of the two premises of this pair.
    #[must_use]
    pub fn references(&self, premise: ItemId) -> bool {
        match premise {
            ItemId::Fact(id) => self.fact == id,
            ItemId::Rule(id) => self.rule == id,
        }
    }
}

/// A statement held by the knowledge base.
///
/// Equality is structural: two facts are equal when their statements are,
/// regardless of id or provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fact {
    /// Unique identifier.
    pub id: FactId,
    /// The statement this fact holds.
    pub statement: Statement,

    /// Directly asserted by the user.
    pub asserted: bool,

    /// Every derivation of this fact, one pair per successful firing.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supported_by: Vec<SupportPair>,

    /// Facts with a derivation naming this fact.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supports_facts: Vec<FactId>,

    /// Rules with a derivation naming this fact.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supports_rules: Vec<RuleId>,
}

impl Fact {
    /// Creates an asserted fact with no derivations.
    #[must_use]
    pub fn new(statement: Statement) -> Self {
        Self::with_support(statement, Vec::new())
    }

    /// Creates a derived (non-asserted) fact with a single support pair.
    #[must_use]
    pub fn derived(statement: Statement, support: SupportPair) -> Self {
        Self::with_support(statement, vec![support])
    }

    /// Creates a fact carrying `supported_by`; it counts as asserted exactly
    /// when no support is given.
    #[must_use]
    pub fn with_support(statement: Statement, supported_by: Vec<SupportPair>) -> Self {
        Self {
            id: FactId::new(),
            statement,
            asserted: supported_by.is_empty(),
            supported_by,
            supports_facts: Vec::new(),
            supports_rules: Vec::new(),
        }
    }

    /// Returns true if the fact has some reason to exist.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.asserted || !self.supported_by.is_empty()
    }
}

impl PartialEq for Fact {
    fn eq(&self, other: &Self) -> bool {
        self.statement == other.statement
    }
}

impl Eq for Fact {}

impl std::hash::Hash for Fact {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.statement.hash(state);
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fact: {}", self.statement)?;
        if self.asserted {
            write!(f, " ASSERTED")?;
        }
        if !self.supported_by.is_empty() {
            write!(f, " SUPPORTED BY {}", self.supported_by.len())?;
        }
        Ok(())
    }
}

/// Conjunctive premises implying a conclusion.
///
/// `lhs[0]` is matched first; when a rule with several premises fires
/// partially, the remaining premises become a new carried rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    /// Unique identifier.
    pub id: RuleId,
    /// Premises, never empty.
    pub lhs: Vec<Statement>,
    /// Conclusion.
    pub rhs: Statement,
    /// Directly asserted by the user.
    pub asserted: bool,

    /// Every derivation of this carried rule.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supported_by: Vec<SupportPair>,

    /// Facts with a derivation naming this rule.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supports_facts: Vec<FactId>,

    /// Carried rules with a derivation naming this rule.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supports_rules: Vec<RuleId>,
}

impl Rule {
    /// Creates an asserted rule.
    pub fn new(lhs: Vec<Statement>, rhs: Statement) -> Result<Self, ValidationError> {
        Self::with_support(lhs, rhs, Vec::new())
    }

    /// Creates a derived (carried) rule with a single support pair.
    pub fn derived(
        lhs: Vec<Statement>,
        rhs: Statement,
        support: SupportPair,
    ) -> Result<Self, ValidationError> {
        Self::with_support(lhs, rhs, vec![support])
    }

    /// Creates a rule carrying `supported_by`; asserted exactly when empty.
    pub fn with_support(
        lhs: Vec<Statement>,
        rhs: Statement,
        supported_by: Vec<SupportPair>,
    ) -> Result<Self, ValidationError> {
        if lhs.is_empty() {
            return Err(ValidationError::EmptyPremises);
        }
        Ok(Self {
            id: RuleId::new(),
            lhs,
            rhs,
            asserted: supported_by.is_empty(),
            supported_by,
            supports_facts: Vec::new(),
            supports_rules: Vec::new(),
        })
    }

    /// Returns true if the rule has some reason to exist.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.asserted || !self.supported_by.is_empty()
    }

    /// Renders `((l1) (l2) ...) -> (rhs)`.
    #[must_use]
    pub fn signature(&self) -> String {
        let premises: Vec<String> = self.lhs.iter().map(ToString::to_string).collect();
        format!("({}) -> {}", premises.join(" "), self.rhs)
    }

    /// Conclusion variables that no premise binds.
    ///
    /// Firing such a rule derives a fact that still holds a variable.
    #[must_use]
    pub fn unbound_variables(&self) -> Vec<&str> {
        if self.rhs.is_ground() {
            return Vec::new();
        }
        let mut unbound: Vec<&str> = self
            .rhs
            .variables()
            .filter(|v| !self.lhs.iter().any(|premise| premise.variables().any(|p| p == *v)))
            .collect();
        unbound.dedup();
        unbound
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.lhs == other.lhs && self.rhs == other.rhs
    }
}

impl Eq for Rule {}

impl std::hash::Hash for Rule {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.lhs.hash(state);
        self.rhs.hash(state);
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule: {}", self.signature())?;
        if self.asserted {
            write!(f, " ASSERTED")?;
        }
        if !self.supported_by.is_empty() {
            write!(f, " SUPPORTED BY {}", self.supported_by.len())?;
        }
        Ok(())
    }
}

/// Anything that can be asserted, asked or retracted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Item {
    /// A fact, or a query when passed to `ask`.
    Fact(Fact),
    /// An implication rule.
    Rule(Rule),
}

impl Item {
    /// Returns true for facts.
    #[must_use]
    pub const fn is_fact(&self) -> bool {
        matches!(self, Self::Fact(_))
    }

    /// Returns true for rules.
    #[must_use]
    pub const fn is_rule(&self) -> bool {
        matches!(self, Self::Rule(_))
    }
}

impl From<Fact> for Item {
    fn from(fact: Fact) -> Self {
        Self::Fact(fact)
    }
}

impl From<Rule> for Item {
    fn from(rule: Rule) -> Self {
        Self::Rule(rule)
    }
}

impl From<Statement> for Item {
    fn from(statement: Statement) -> Self {
        Self::Fact(Fact::new(statement))
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fact(fact) => write!(f, "{fact}"),
            Self::Rule(rule) => write!(f, "{rule}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn st(predicate: &str, tokens: &[&str]) -> Statement {
        Statement::of(predicate, tokens).unwrap()
    }

    #[test]
    fn fact_asserted_iff_unsupported() {
        let asserted = Fact::new(st("a", &["1"]));
        assert!(asserted.asserted);
        assert!(asserted.is_live());

        let pair = SupportPair::new(FactId::new(), RuleId::new());
        let derived = Fact::derived(st("a", &["1"]), pair);
        assert!(!derived.asserted);
        assert_eq!(derived.supported_by, vec![pair]);
    }

    #[test]
    fn fact_equality_ignores_provenance() {
        let a = Fact::new(st("a", &["1"]));
        let b = Fact::derived(st("a", &["1"]), SupportPair::new(FactId::new(), RuleId::new()));
        assert_ne!(a.id, b.id);
        assert_eq!(a, b);
    }

    #[test]
    fn rule_requires_premises() {
        assert_eq!(
            Rule::new(vec![], st("b", &["?x"])).unwrap_err(),
            ValidationError::EmptyPremises
        );
    }

    #[test]
    fn unbound_conclusion_variables() {
        let safe = Rule::new(vec![st("a", &["?x"]), st("b", &["?y"])], st("c", &["?x", "?y"])).unwrap();
        assert!(safe.unbound_variables().is_empty());

        let ground = Rule::new(vec![st("a", &["?x"])], st("c", &["1"])).unwrap();
        assert!(ground.unbound_variables().is_empty());

        let unsafe_rule = Rule::new(vec![st("a", &["?x"])], st("c", &["?x", "?z", "?z"])).unwrap();
        assert_eq!(unsafe_rule.unbound_variables(), vec!["z"]);
    }

    #[test]
    fn rule_display() {
        let rule = Rule::new(vec![st("a", &["?x"]), st("b", &["?x"])], st("c", &["?x"])).unwrap();
        assert_eq!(rule.signature(), "((a ?x) (b ?x)) -> (c ?x)");
        assert_eq!(rule.to_string(), "rule: ((a ?x) (b ?x)) -> (c ?x) ASSERTED");
    }

    #[test]
    fn support_pair_references() {
        let f = FactId::new();
        let r = RuleId::new();
        let pair = SupportPair::new(f, r);
        assert!(pair.references(ItemId::Fact(f)));
        assert!(pair.references(ItemId::Rule(r)));
        assert!(!pair.references(ItemId::Fact(FactId::new())));
    }

    #[test]
    fn item_from_statement_is_asserted_fact() {
        let item: Item = st("a", &["1"]).into();
        assert!(item.is_fact());
        let Item::Fact(fact) = item else {
            panic!("expected fact");
        };
        assert!(fact.asserted);
    }
}
