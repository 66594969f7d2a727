//! The knowledge base: the single mutation point for facts and rules.
//!
//! Every fact or rule that enters through [`KnowledgeBase::add`] is paired
//! against every existing member of the opposite kind and handed to the
//! [`InferenceEngine`]; derived items come back through `add`, so one call
//! runs the whole forward-chaining fixed point before returning.
//!
//! Members live in arenas keyed by [`FactId`]/[`RuleId`]. Support pairs and
//! back-references are ids into those arenas, never aliases, and the
//! structural indices map content back to the canonical stored member.

mod arena;
mod retract;

use std::collections::HashMap;
use std::fmt;

use crate::binding::{is_query, unify, ListOfBindings};
use crate::config::KbConfig;
use crate::error::{KbError, KbResult, QueryError, ValidationError};
use crate::fact::{Fact, FactId, Item, ItemId, Rule, RuleId, SupportPair};
use crate::inference::InferenceEngine;
use crate::snapshot::KbSnapshot;
use crate::term::Statement;

use arena::Arena;

pub use retract::{Retraction, RetractionReport};

/// Forward-chaining knowledge base with truth maintenance.
///
/// # Examples
///
/// ```
/// use kyrotms::{KnowledgeBase, Statement};
///
/// let mut kb = KnowledgeBase::new();
/// kb.assert_rule(
///     vec![Statement::of("man", &["?x"]).unwrap()],
///     Statement::of("mortal", &["?x"]).unwrap(),
/// )
/// .unwrap();
/// kb.assert_fact(Statement::of("man", &["socrates"]).unwrap());
///
/// let mortal = Statement::of("mortal", &["socrates"]).unwrap();
/// assert!(kb.find_fact(&mortal).is_some());
/// ```
#[derive(Debug, Default)]
pub struct KnowledgeBase {
    facts: Arena<Fact>,
    rules: Arena<Rule>,
    engine: InferenceEngine,
    config: KbConfig,
}

impl KnowledgeBase {
    /// Creates an empty knowledge base with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty knowledge base with the given configuration.
    #[must_use]
    pub fn with_config(config: KbConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &KbConfig {
        &self.config
    }

    /// Asserts a fact or rule. This is the public entry point for user input.
    ///
    /// Returns the id of the canonical stored item, or `None` if the item was
    /// rejected (a derived item whose premises are not in the knowledge base).
    pub fn assert(&mut self, item: impl Into<Item>) -> Option<ItemId> {
        let item = item.into();
        if self.config.verbosity.reports_assertions() {
            tracing::info!(item = %item, "asserting");
        }
        self.add(item)
    }

    /// Asserts a single statement as a fact.
    pub fn assert_fact(&mut self, statement: Statement) -> FactId {
        let fact = Fact::new(statement);
        let fallback = fact.id;
        // An asserted fact is never rejected.
        self.assert(fact).and_then(ItemId::as_fact).unwrap_or(fallback)
    }

    /// Asserts a rule built from `lhs` and `rhs`.
    pub fn assert_rule(&mut self, lhs: Vec<Statement>, rhs: Statement) -> KbResult<RuleId> {
        let rule = Rule::new(lhs, rhs)?;
        self.assert(rule)
            .and_then(ItemId::as_rule)
            .ok_or_else(|| KbError::internal("asserted rule was not stored"))
    }

    /// Asserts every item in order.
    pub fn assert_all<I>(&mut self, items: I) -> Vec<Option<ItemId>>
    where
        I: IntoIterator,
        I::Item: Into<Item>,
    {
        items.into_iter().map(|item| self.assert(item)).collect()
    }

    /// Adds a fact or rule.
    ///
    /// A new item is stored and immediately tested against every existing
    /// member of the opposite kind. An item already present (by content) has
    /// its provenance merged into the stored copy instead: incoming support
    /// pairs are appended, or, if there are none, the stored copy is marked
    /// asserted.
    pub fn add(&mut self, item: impl Into<Item>) -> Option<ItemId> {
        match item.into() {
            Item::Fact(fact) => self.add_fact(fact).map(ItemId::Fact),
            Item::Rule(rule) => self.add_rule(rule).map(ItemId::Rule),
        }
    }

    fn add_fact(&mut self, mut fact: Fact) -> Option<FactId> {
        if self.config.verbosity.reports_inference() {
            tracing::debug!(fact = %fact.statement, "adding fact");
        }
        let incoming_support = !fact.supported_by.is_empty();
        fact.supported_by = self.live_support(std::mem::take(&mut fact.supported_by));

        if let Some(existing) = self.facts.lookup(&fact.statement) {
            let stored = self.facts.get_mut(existing)?;
            if incoming_support {
                stored.supported_by.extend(fact.supported_by.iter().copied());
            } else {
                stored.asserted = true;
            }
            self.record_derivations(&fact.supported_by, ItemId::Fact(existing));
            return Some(existing);
        }

        if !fact.is_live() {
            tracing::warn!(fact = %fact.statement, "ignoring derived fact with no live support");
            return None;
        }

        if self.facts.contains(fact.id) {
            fact.id = FactId::new();
        }
        let id = fact.id;
        let support = fact.supported_by.clone();
        fact.supports_facts.clear();
        fact.supports_rules.clear();
        self.facts.insert(fact);
        self.record_derivations(&support, ItemId::Fact(id));

        let engine = self.engine;
        let rules = self.rules.ids().to_vec();
        for rule in rules {
            engine.fc_infer(id, rule, self);
        }
        Some(id)
    }

    fn add_rule(&mut self, mut rule: Rule) -> Option<RuleId> {
        if self.config.verbosity.reports_inference() {
            tracing::debug!(rule = %rule.signature(), "adding rule");
        }
        if rule.lhs.is_empty() {
            tracing::warn!(error = %ValidationError::EmptyPremises, "ignoring rule");
            return None;
        }
        let incoming_support = !rule.supported_by.is_empty();
        rule.supported_by = self.live_support(std::mem::take(&mut rule.supported_by));

        let key = (rule.lhs.clone(), rule.rhs.clone());
        if let Some(existing) = self.rules.lookup(&key) {
            let stored = self.rules.get_mut(existing)?;
            if incoming_support {
                stored.supported_by.extend(rule.supported_by.iter().copied());
            } else {
                stored.asserted = true;
            }
            self.record_derivations(&rule.supported_by, ItemId::Rule(existing));
            return Some(existing);
        }

        if !rule.is_live() {
            tracing::warn!(rule = %rule.signature(), "ignoring derived rule with no live support");
            return None;
        }

        if self.rules.contains(rule.id) {
            rule.id = RuleId::new();
        }
        let id = rule.id;
        let support = rule.supported_by.clone();
        rule.supports_facts.clear();
        rule.supports_rules.clear();
        self.rules.insert(rule);
        self.record_derivations(&support, ItemId::Rule(id));

        let engine = self.engine;
        let facts = self.facts.ids().to_vec();
        for fact in facts {
            engine.fc_infer(fact, id, self);
        }
        Some(id)
    }

    /// Keeps only the support pairs whose premises are both stored.
    fn live_support(&self, pairs: Vec<SupportPair>) -> Vec<SupportPair> {
        pairs
            .into_iter()
            .filter(|pair| {
                let live = self.facts.contains(pair.fact) && self.rules.contains(pair.rule);
                if !live {
                    tracing::warn!(fact = %pair.fact, rule = %pair.rule, "dropping support pair with missing premise");
                }
                live
            })
            .collect()
    }

    /// Appends `derived` to the back-references of both premises of each pair.
    fn record_derivations(&mut self, pairs: &[SupportPair], derived: ItemId) {
        for pair in pairs {
            if let Some(premise) = self.facts.get_mut(pair.fact) {
                match derived {
                    ItemId::Fact(id) => premise.supports_facts.push(id),
                    ItemId::Rule(id) => premise.supports_rules.push(id),
                }
            }
            if let Some(premise) = self.rules.get_mut(pair.rule) {
                match derived {
                    ItemId::Fact(id) => premise.supports_facts.push(id),
                    ItemId::Rule(id) => premise.supports_rules.push(id),
                }
            }
        }
    }

    /// Asks which stored facts match a query fact.
    ///
    /// Returns one answer per matching fact, in insertion order. Only facts
    /// are valid queries; a rule is reported and rejected.
    pub fn ask(&self, query: &Item) -> Result<ListOfBindings, QueryError> {
        if self.config.verbosity.reports_assertions() {
            tracing::info!(query = %query, "asking");
        }
        if !is_query(query) {
            let err = QueryError::NotAFact {
                rule: query.to_string(),
            };
            tracing::warn!(error = %err, "invalid ask");
            return Err(err);
        }
        let Item::Fact(fact) = query else {
            return Ok(ListOfBindings::new());
        };
        Ok(self.ask_statement(&fact.statement))
    }

    /// Unifies `statement` against every stored fact.
    #[must_use]
    pub fn ask_statement(&self, statement: &Statement) -> ListOfBindings {
        let mut answers = ListOfBindings::new();
        for fact in self.facts.iter() {
            if let Some(bindings) = unify(statement, &fact.statement) {
                answers.add_bindings(bindings, vec![fact.id]);
            }
        }
        answers
    }

    /// Facts in insertion order.
    pub fn facts(&self) -> impl Iterator<Item = &Fact> + '_ {
        self.facts.iter()
    }

    /// Rules in insertion order.
    pub fn rules(&self) -> impl Iterator<Item = &Rule> + '_ {
        self.rules.iter()
    }

    /// The fact with this id.
    #[must_use]
    pub fn fact(&self, id: FactId) -> Option<&Fact> {
        self.facts.get(id)
    }

    /// The rule with this id.
    #[must_use]
    pub fn rule(&self, id: RuleId) -> Option<&Rule> {
        self.rules.get(id)
    }

    /// The stored fact structurally equal to `statement`.
    #[must_use]
    pub fn find_fact(&self, statement: &Statement) -> Option<&Fact> {
        self.facts.lookup(statement).and_then(|id| self.facts.get(id))
    }

    /// The stored rule structurally equal to `lhs -> rhs`.
    #[must_use]
    pub fn find_rule(&self, lhs: &[Statement], rhs: &Statement) -> Option<&Rule> {
        self.rules
            .lookup(&(lhs.to_vec(), rhs.clone()))
            .and_then(|id| self.rules.get(id))
    }

    /// Returns true if a structurally equal item is stored.
    #[must_use]
    pub fn contains(&self, item: &Item) -> bool {
        match item {
            Item::Fact(fact) => self.find_fact(&fact.statement).is_some(),
            Item::Rule(rule) => self.find_rule(&rule.lhs, &rule.rhs).is_some(),
        }
    }

    /// Number of stored facts.
    #[must_use]
    pub fn fact_count(&self) -> usize {
        self.facts.len()
    }

    /// Number of stored rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Clones every member, in insertion order, into a serializable snapshot.
    #[must_use]
    pub fn snapshot(&self) -> KbSnapshot {
        KbSnapshot {
            facts: self.facts.iter().cloned().collect(),
            rules: self.rules.iter().cloned().collect(),
        }
    }

    /// Checks the support-graph invariants.
    ///
    /// - every member is asserted or has at least one support pair;
    /// - every support pair names stored premises;
    /// - for each premise/dependent pair, the number of back-references equals
    ///   the number of support pairs naming that premise;
    /// - the structural indices agree with the arenas.
    pub fn verify_integrity(&self) -> KbResult<()> {
        self.facts.check_index().map_err(KbError::internal)?;
        self.rules.check_index().map_err(KbError::internal)?;

        // (premise, dependent) -> pairs minus back-references
        let mut balance: HashMap<(ItemId, ItemId), i64> = HashMap::new();

        let members = self
            .facts
            .iter()
            .map(|f| (ItemId::Fact(f.id), f.is_live(), &f.supported_by, &f.supports_facts, &f.supports_rules))
            .chain(self.rules.iter().map(|r| {
                (ItemId::Rule(r.id), r.is_live(), &r.supported_by, &r.supports_facts, &r.supports_rules)
            }));

        for (id, live, supported_by, supports_facts, supports_rules) in members {
            if !live {
                return Err(KbError::internal(format!(
                    "{} is neither asserted nor supported",
                    self.describe(id)
                )));
            }
            for pair in supported_by {
                if !self.facts.contains(pair.fact) || !self.rules.contains(pair.rule) {
                    return Err(KbError::internal(format!(
                        "{} has a support pair naming a missing premise",
                        self.describe(id)
                    )));
                }
                *balance.entry((ItemId::Fact(pair.fact), id)).or_default() += 1;
                *balance.entry((ItemId::Rule(pair.rule), id)).or_default() += 1;
            }
            let dependents = supports_facts
                .iter()
                .map(|d| ItemId::Fact(*d))
                .chain(supports_rules.iter().map(|d| ItemId::Rule(*d)));
            for dependent in dependents {
                *balance.entry((id, dependent)).or_default() -= 1;
            }
        }

        if let Some(((premise, dependent), _)) = balance.iter().find(|(_, n)| **n != 0) {
            return Err(KbError::internal(format!(
                "support of {} by {} is not mirrored by a back-reference",
                self.describe(*dependent),
                self.describe(*premise)
            )));
        }
        Ok(())
    }

    fn describe(&self, id: ItemId) -> String {
        match id {
            ItemId::Fact(f) => self
                .facts
                .get(f)
                .map_or_else(|| format!("missing fact {f}"), |fact| fact.statement.to_string()),
            ItemId::Rule(r) => self
                .rules
                .get(r)
                .map_or_else(|| format!("missing rule {r}"), Rule::signature),
        }
    }
}

impl fmt::Display for KnowledgeBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Knowledge Base:")?;
        for fact in self.facts.iter() {
            writeln!(f, "{fact}")?;
        }
        for rule in self.rules.iter() {
            writeln!(f, "{rule}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Verbosity;
    use crate::term::Term;

    fn st(predicate: &str, tokens: &[&str]) -> Statement {
        Statement::of(predicate, tokens).unwrap()
    }

    fn kb() -> KnowledgeBase {
        KnowledgeBase::with_config(KbConfig::silent())
    }

    #[test]
    fn asserting_twice_keeps_one_copy() {
        let mut kb = kb();
        let first = kb.assert_fact(st("a", &["1"]));
        let second = kb.assert_fact(st("a", &["1"]));
        assert_eq!(first, second);
        assert_eq!(kb.fact_count(), 1);
        assert!(kb.fact(first).unwrap().asserted);
        kb.verify_integrity().unwrap();
    }

    #[test]
    fn derived_fact_records_support_and_back_references() {
        let mut kb = kb();
        let rule = kb.assert_rule(vec![st("a", &["?x"])], st("c", &["?x"])).unwrap();
        let fact = kb.assert_fact(st("a", &["1"]));

        let derived = kb.find_fact(&st("c", &["1"])).unwrap();
        assert!(!derived.asserted);
        assert_eq!(derived.supported_by, vec![SupportPair::new(fact, rule)]);
        assert_eq!(kb.fact(fact).unwrap().supports_facts, vec![derived.id]);
        assert_eq!(kb.rule(rule).unwrap().supports_facts, vec![derived.id]);
        kb.verify_integrity().unwrap();
    }

    #[test]
    fn asserting_a_derived_fact_marks_it_asserted() {
        let mut kb = kb();
        kb.assert_rule(vec![st("a", &["?x"])], st("c", &["?x"])).unwrap();
        kb.assert_fact(st("a", &["1"]));
        let c = kb.assert_fact(st("c", &["1"]));

        let stored = kb.fact(c).unwrap();
        assert!(stored.asserted);
        assert_eq!(stored.supported_by.len(), 1);
        assert_eq!(kb.fact_count(), 2);
    }

    #[test]
    fn rederivation_appends_support_to_the_stored_fact() {
        let mut kb = kb();
        kb.assert_rule(vec![st("a", &["?x"])], st("c", &["?x"])).unwrap();
        kb.assert_rule(vec![st("b", &["?x"])], st("c", &["?x"])).unwrap();
        kb.assert_fact(st("a", &["1"]));
        kb.assert_fact(st("b", &["1"]));

        let c = kb.find_fact(&st("c", &["1"])).unwrap();
        assert_eq!(c.supported_by.len(), 2);
        assert_eq!(kb.fact_count(), 3);
        kb.verify_integrity().unwrap();
    }

    #[test]
    fn support_pairs_with_missing_premises_are_dropped() {
        let mut kb = kb();
        let orphan = Fact::derived(st("x", &["1"]), SupportPair::new(FactId::new(), RuleId::new()));
        assert_eq!(kb.add(orphan), None);
        assert_eq!(kb.fact_count(), 0);
        kb.verify_integrity().unwrap();
    }

    #[test]
    fn ask_returns_bindings_per_matching_fact() {
        let mut kb = kb();
        let red = kb.assert_fact(st("color", &["cube", "red"]));
        let blue = kb.assert_fact(st("color", &["ball", "blue"]));
        kb.assert_fact(st("size", &["cube", "big"]));

        let answers = kb.ask(&st("color", &["?x", "?c"]).into()).unwrap();
        assert_eq!(answers.len(), 2);
        assert!(answers.references(red));
        assert!(answers.references(blue));

        let first = answers.iter().next().unwrap();
        assert_eq!(first.bindings.bound_to("x"), Some(&Term::constant("cube")));
    }

    #[test]
    fn ask_rejects_rules() {
        let kb = kb();
        let rule = Rule::new(vec![st("a", &["?x"])], st("b", &["?x"])).unwrap();
        let err = kb.ask(&rule.into()).unwrap_err();
        assert!(matches!(err, QueryError::NotAFact { .. }));
    }

    #[test]
    fn ask_with_no_match_is_empty() {
        let mut kb = kb();
        kb.assert_fact(st("a", &["1"]));
        assert!(kb.ask(&st("a", &["2"]).into()).unwrap().is_empty());
    }

    #[test]
    fn display_lists_facts_then_rules() {
        let mut kb = KnowledgeBase::with_config(KbConfig::with_verbosity(Verbosity::Verbose));
        kb.assert_fact(st("a", &["1"]));
        kb.assert_rule(vec![st("b", &["?x"])], st("c", &["?x"])).unwrap();
        let text = kb.to_string();
        assert_eq!(
            text,
            "Knowledge Base:\nfact: (a 1) ASSERTED\nrule: ((b ?x)) -> (c ?x) ASSERTED\n"
        );
    }
}
