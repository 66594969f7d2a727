//! # kyrotms - Forward-chaining rule engine with truth maintenance
//!
//! kyrotms holds a knowledge base of facts and implication rules, derives new
//! facts and rules by unification-based pattern matching, and records *why*
//! each derived item exists. Retracting a fact removes everything that
//! depended solely on it.
//!
//! ## Core Concepts
//!
//! - **Statement**: a predicate over constants and `?variables`
//! - **Fact**: a statement in the knowledge base, asserted and/or derived
//! - **Rule**: conjunctive premises implying a conclusion
//! - **Support pair**: the `(fact, rule)` premises of one derivation
//! - **Rule carrying**: partial firing of a multi-premise rule, yielding a
//!   smaller rule over the remaining premises
//!
//! ## Usage
//!
//! ```rust
//! use kyrotms::{read, KnowledgeBase, Retraction};
//!
//! let mut kb = KnowledgeBase::new();
//! let program = read::parse_program(
//!     "fact: (isa cube block)\n\
//!      rule: ((isa ?x block) (on ?x table)) -> (grounded ?x)\n\
//!      fact: (on cube table)\n",
//! )?;
//! kb.assert_all(program);
//!
//! let grounded = read::parse_statement("(grounded cube)")?;
//! assert!(kb.find_fact(&grounded).is_some());
//!
//! let on_table = read::parse_statement("(on cube table)")?;
//! let outcome = kb.retract_statement(&on_table)?;
//! assert!(matches!(outcome, Retraction::Removed(_)));
//! assert!(kb.find_fact(&grounded).is_none());
//! # Ok::<(), kyrotms::KbError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod binding;
pub mod config;
pub mod error;
pub mod fact;
pub mod inference;
pub mod kb;
pub mod read;
pub mod snapshot;
pub mod term;

// Re-export primary types at crate root for convenience
pub use binding::{instantiate, is_query, unify, Answer, Binding, Bindings, ListOfBindings};
pub use config::{KbConfig, Verbosity};
pub use error::{KbError, KbResult, ParseError, QueryError, RetractionError, ValidationError};
pub use fact::{Fact, FactId, Item, ItemId, Rule, RuleId, SupportPair};
pub use inference::InferenceEngine;
pub use kb::{KnowledgeBase, Retraction, RetractionReport};
pub use snapshot::KbSnapshot;
pub use term::{Statement, Term};
