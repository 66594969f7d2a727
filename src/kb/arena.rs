//! Insertion-ordered member storage with a structural lookup index.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use crate::fact::{Fact, FactId, Rule, RuleId};
use crate::term::Statement;

/// A knowledge base member: addressable by id, identified by content.
pub(crate) trait Member {
    type Id: Copy + Eq + Hash;
    type Key: Eq + Hash;

    fn id(&self) -> Self::Id;
    fn key(&self) -> Self::Key;
}

impl Member for Fact {
    type Id = FactId;
    type Key = Statement;

    fn id(&self) -> FactId {
        self.id
    }

    fn key(&self) -> Statement {
        self.statement.clone()
    }
}

/// Rules are identified by premises plus conclusion.
pub(crate) type RuleKey = (Vec<Statement>, Statement);

impl Member for Rule {
    type Id = RuleId;
    type Key = RuleKey;

    fn id(&self) -> RuleId {
        self.id
    }

    fn key(&self) -> RuleKey {
        (self.lhs.clone(), self.rhs.clone())
    }
}

pub(crate) struct Arena<T: Member> {
    by_id: HashMap<T::Id, T>,
    order: Vec<T::Id>,
    index: HashMap<T::Key, T::Id>,
}

impl<T: Member> Default for Arena<T> {
    fn default() -> Self {
        Self {
            by_id: HashMap::new(),
            order: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: Member + fmt::Debug> fmt::Debug for Arena<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: Member> Arena<T> {
    pub(crate) fn get(&self, id: T::Id) -> Option<&T> {
        self.by_id.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: T::Id) -> Option<&mut T> {
        self.by_id.get_mut(&id)
    }

    pub(crate) fn contains(&self, id: T::Id) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Canonical id of the member structurally equal to `key`.
    pub(crate) fn lookup(&self, key: &T::Key) -> Option<T::Id> {
        self.index.get(key).copied()
    }

    /// Appends a member. The caller has checked that its key is not present.
    pub(crate) fn insert(&mut self, member: T) {
        let id = member.id();
        self.index.insert(member.key(), id);
        self.order.push(id);
        self.by_id.insert(id, member);
    }

    pub(crate) fn remove(&mut self, id: T::Id) -> Option<T> {
        let member = self.by_id.remove(&id)?;
        self.index.remove(&member.key());
        self.order.retain(|other| *other != id);
        Some(member)
    }

    /// Ids in insertion order.
    pub(crate) fn ids(&self) -> &[T::Id] {
        &self.order
    }

    /// Members in insertion order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.order.iter().filter_map(|id| self.by_id.get(id))
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    /// Checks that the id map, order and index describe the same members.
    pub(crate) fn check_index(&self) -> Result<(), String> {
        if self.by_id.len() != self.order.len() || self.index.len() != self.order.len() {
            return Err(format!(
                "arena size mismatch: by_id={} order={} index={}",
                self.by_id.len(),
                self.order.len(),
                self.index.len()
            ));
        }
        for id in &self.order {
            let Some(member) = self.by_id.get(id) else {
                return Err("ordered id missing from arena".to_string());
            };
            if self.index.get(&member.key()) != Some(id) {
                return Err("structural index does not point at stored member".to_string());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fact(predicate: &str, tokens: &[&str]) -> Fact {
        Fact::new(Statement::of(predicate, tokens).unwrap())
    }

    #[test]
    fn insert_lookup_remove_keeps_order() {
        let mut arena: Arena<Fact> = Arena::default();
        let a = fact("a", &["1"]);
        let b = fact("b", &["1"]);
        let c = fact("c", &["1"]);
        let (ida, idb, idc) = (a.id, b.id, c.id);
        arena.insert(a);
        arena.insert(b);
        arena.insert(c);

        assert_eq!(arena.lookup(&Statement::of("b", &["1"]).unwrap()), Some(idb));
        assert_eq!(arena.ids(), &[ida, idb, idc]);

        let removed = arena.remove(idb).unwrap();
        assert_eq!(removed.id, idb);
        assert_eq!(arena.ids(), &[ida, idc]);
        assert!(arena.lookup(&Statement::of("b", &["1"]).unwrap()).is_none());
        assert!(arena.remove(idb).is_none());
        assert!(arena.check_index().is_ok());
    }

    #[test]
    fn rules_are_keyed_by_premises_and_conclusion() {
        let lhs = vec![Statement::of("a", &["?x"]).unwrap()];
        let rhs = Statement::of("b", &["?x"]).unwrap();
        let rule = Rule::new(lhs.clone(), rhs.clone()).unwrap();
        let id = rule.id;

        let mut arena: Arena<Rule> = Arena::default();
        arena.insert(rule);
        assert_eq!(arena.lookup(&(lhs, rhs)), Some(id));
        assert_eq!(arena.len(), 1);
    }
}
