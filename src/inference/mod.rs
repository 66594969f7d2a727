//! Inference layer.
//!
//! Forward chaining only: a fact and a rule go in, and at most one derived
//! fact or carried rule is submitted back to the knowledge base.

mod forward;

pub use forward::InferenceEngine;
