//! Serializable view of a knowledge base.
//!
//! A snapshot is for inspection and golden tests: it clones every member with
//! its ids and support links, in insertion order. There is no path back from
//! a snapshot into a live knowledge base.

use serde::{Deserialize, Serialize};

use crate::error::{KbError, KbResult};
use crate::fact::{Fact, Rule};

/// Facts and rules, in insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KbSnapshot {
    /// Stored facts.
    pub facts: Vec<Fact>,
    /// Stored rules.
    pub rules: Vec<Rule>,
}

impl KbSnapshot {
    /// Statements of every fact, rendered as text.
    #[must_use]
    pub fn fact_statements(&self) -> Vec<String> {
        self.facts.iter().map(|f| f.statement.to_string()).collect()
    }
}

/// Serialize a snapshot to pretty JSON.
pub fn to_json_pretty(snapshot: &KbSnapshot) -> KbResult<String> {
    serde_json::to_string_pretty(snapshot).map_err(|e| KbError::internal(format!("serialize snapshot: {e}")))
}

/// Deserialize a snapshot from JSON.
pub fn from_json(s: &str) -> KbResult<KbSnapshot> {
    serde_json::from_str::<KbSnapshot>(s).map_err(|e| KbError::internal(format!("deserialize snapshot: {e}")))
}
