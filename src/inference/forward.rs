use crate::binding::{instantiate, unify};
use crate::fact::{Fact, FactId, Item, Rule, RuleId, SupportPair};
use crate::kb::KnowledgeBase;

/// Stateless forward-chaining step.
#[derive(Debug, Default, Clone, Copy)]
pub struct InferenceEngine;

impl InferenceEngine {
    /// Fires `rule` against `fact` if its first premise matches.
    ///
    /// A single-premise rule yields a derived fact; a rule with more premises
    /// yields a carried rule over the remaining premises, with the bindings
    /// substituted throughout. Either way the derived item carries one support
    /// pair naming `fact` and `rule` and is submitted through
    /// [`KnowledgeBase::assert`], which records the derivation on both
    /// premises' back-references. Ids that are not stored are ignored.
    pub fn fc_infer(self, fact: FactId, rule: RuleId, kb: &mut KnowledgeBase) {
        let Some(derived) = Self::derive(fact, rule, kb) else {
            return;
        };
        kb.assert(derived);
    }

    fn derive(fact_id: FactId, rule_id: RuleId, kb: &KnowledgeBase) -> Option<Item> {
        let fact = kb.fact(fact_id)?;
        let rule = kb.rule(rule_id)?;
        if kb.config().verbosity.reports_inference() {
            tracing::debug!(
                fact = %fact.statement,
                rule = %rule.signature(),
                "attempting inference"
            );
        }

        let (first, rest) = rule.lhs.split_first()?;
        let bindings = unify(first, &fact.statement)?;
        let support = SupportPair::new(fact_id, rule_id);
        let rhs = instantiate(&rule.rhs, &bindings);

        if rest.is_empty() {
            return Some(Fact::derived(rhs, support).into());
        }

        let lhs = rest.iter().map(|premise| instantiate(premise, &bindings)).collect();
        Rule::derived(lhs, rhs, support).ok().map(Item::from)
    }
}
