//! Fact retraction and support-graph cascade.
//!
//! Removal walks the support graph outward from the retracted fact with an
//! explicit worklist. Each removed member takes exactly one support pair away
//! from each of its dependents (one per recorded back-reference); dependents
//! left with no support and no asserted flag are removed in turn.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::error::RetractionError;
use crate::fact::{Fact, FactId, Item, ItemId, Rule, RuleId};
use crate::term::Statement;

use super::KnowledgeBase;

/// Members removed by one retraction, in removal order.
///
/// Removed members are detached: their support pairs and back-references
/// are empty, since every id they named has been removed or unlinked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetractionReport {
    /// Facts removed, the retracted fact first.
    pub removed_facts: Vec<Fact>,
    /// Derived rules dropped along the way.
    pub removed_rules: Vec<Rule>,
}

impl RetractionReport {
    /// Returns true if a fact with this statement was removed.
    #[must_use]
    pub fn removed_fact(&self, statement: &Statement) -> bool {
        self.removed_facts.iter().any(|f| &f.statement == statement)
    }
}

/// Outcome of a successful `retract`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "report", rename_all = "snake_case")]
pub enum Retraction {
    /// No such fact is stored; nothing changed.
    NotPresent,
    /// The fact is still derivable; only its asserted flag was cleared.
    Unasserted,
    /// The fact and everything that depended solely on it were removed.
    Removed(RetractionReport),
}

impl KnowledgeBase {
    /// Retracts a fact.
    ///
    /// Rules cannot be retracted; passing one is reported and rejected. A
    /// fact that is still derivable only loses its asserted flag, and one that
    /// is derivable but was never asserted cannot be retracted at all. In
    /// every error case the knowledge base is left untouched.
    pub fn retract(&mut self, item: &Item) -> Result<Retraction, RetractionError> {
        match item {
            Item::Fact(fact) => self.retract_statement(&fact.statement),
            Item::Rule(rule) => {
                let err = RetractionError::RuleNotRetractable {
                    rule: rule.signature(),
                };
                tracing::warn!(error = %err, "invalid retraction");
                Err(err)
            }
        }
    }

    /// Retracts the fact structurally equal to `statement`.
    pub fn retract_statement(&mut self, statement: &Statement) -> Result<Retraction, RetractionError> {
        if self.config.verbosity.reports_assertions() {
            tracing::info!(fact = %statement, "retracting");
        }
        let Some(id) = self.facts.lookup(statement) else {
            return Ok(Retraction::NotPresent);
        };
        let Some(real) = self.facts.get_mut(id) else {
            return Ok(Retraction::NotPresent);
        };

        if !real.supported_by.is_empty() {
            if real.asserted {
                real.asserted = false;
                return Ok(Retraction::Unasserted);
            }
            let err = RetractionError::StillSupported {
                fact: real.statement.to_string(),
                support_count: real.supported_by.len(),
            };
            tracing::warn!(error = %err, "irrecoverable retraction");
            return Err(err);
        }

        Ok(Retraction::Removed(self.remove_cascade(ItemId::Fact(id))))
    }

    /// Removes `root` and every member left unsupported by its removal.
    fn remove_cascade(&mut self, root: ItemId) -> RetractionReport {
        let mut report = RetractionReport::default();
        let mut pending = VecDeque::from([root]);

        while let Some(next) = pending.pop_front() {
            match next {
                ItemId::Fact(id) => {
                    let Some(mut fact) = self.facts.remove(id) else {
                        continue;
                    };
                    let facts = std::mem::take(&mut fact.supports_facts);
                    let rules = std::mem::take(&mut fact.supports_rules);
                    self.release_dependents(next, &facts, &rules, &mut pending);
                    if self.config.verbosity.reports_inference() {
                        tracing::debug!(fact = %fact.statement, "removed fact");
                    }
                    report.removed_facts.push(fact);
                }
                ItemId::Rule(id) => {
                    let Some(mut rule) = self.rules.remove(id) else {
                        continue;
                    };
                    let facts = std::mem::take(&mut rule.supports_facts);
                    let rules = std::mem::take(&mut rule.supports_rules);
                    self.release_dependents(next, &facts, &rules, &mut pending);
                    if self.config.verbosity.reports_inference() {
                        tracing::debug!(rule = %rule.signature(), "dropped rule");
                    }
                    report.removed_rules.push(rule);
                }
            }
        }
        report
    }

    fn release_dependents(
        &mut self,
        premise: ItemId,
        supports_facts: &[FactId],
        supports_rules: &[RuleId],
        pending: &mut VecDeque<ItemId>,
    ) {
        let dependents = supports_facts
            .iter()
            .map(|d| ItemId::Fact(*d))
            .chain(supports_rules.iter().map(|d| ItemId::Rule(*d)));
        for dependent in dependents {
            if self.unlink(dependent, premise) {
                pending.push_back(dependent);
            }
        }
    }

    /// Removes one support pair of `dependent` naming `premise`, along with
    /// the back-reference held by the pair's other premise.
    ///
    /// Returns true if `dependent` is left with neither support nor an
    /// asserted flag.
    fn unlink(&mut self, dependent: ItemId, premise: ItemId) -> bool {
        let removed = match dependent {
            ItemId::Fact(id) => self.facts.get_mut(id).and_then(|d| {
                let pos = d.supported_by.iter().position(|p| p.references(premise))?;
                let pair = d.supported_by.remove(pos);
                Some((pair, !d.is_live()))
            }),
            ItemId::Rule(id) => self.rules.get_mut(id).and_then(|d| {
                let pos = d.supported_by.iter().position(|p| p.references(premise))?;
                let pair = d.supported_by.remove(pos);
                Some((pair, !d.is_live()))
            }),
        };
        let Some((pair, dead)) = removed else {
            return false;
        };

        let other = match premise {
            ItemId::Fact(_) => ItemId::Rule(pair.rule),
            ItemId::Rule(_) => ItemId::Fact(pair.fact),
        };
        self.forget_dependent(other, dependent);
        dead
    }

    /// Drops one occurrence of `dependent` from `holder`'s back-references.
    fn forget_dependent(&mut self, holder: ItemId, dependent: ItemId) {
        let (supports_facts, supports_rules) = match holder {
            ItemId::Fact(id) => match self.facts.get_mut(id) {
                Some(f) => (&mut f.supports_facts, &mut f.supports_rules),
                None => return,
            },
            ItemId::Rule(id) => match self.rules.get_mut(id) {
                Some(r) => (&mut r.supports_facts, &mut r.supports_rules),
                None => return,
            },
        };
        match dependent {
            ItemId::Fact(d) => {
                if let Some(pos) = supports_facts.iter().position(|x| *x == d) {
                    supports_facts.remove(pos);
                }
            }
            ItemId::Rule(d) => {
                if let Some(pos) = supports_rules.iter().position(|x| *x == d) {
                    supports_rules.remove(pos);
                }
            }
        }
    }
}
