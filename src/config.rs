//! Knowledge base configuration.

use serde::{Deserialize, Serialize};

/// How much of the knowledge base's activity is reported through `tracing`.
///
/// Diagnostics for rejected queries and retractions are always reported,
/// independent of this setting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verbosity {
    /// Report nothing but diagnostics.
    Silent,
    /// Report assertions and retractions.
    #[default]
    Normal,
    /// Also report every add and every inference attempt.
    Verbose,
}

impl Verbosity {
    /// Assertion and retraction events.
    #[must_use]
    pub fn reports_assertions(self) -> bool {
        self >= Self::Normal
    }

    /// Add and inference events.
    #[must_use]
    pub fn reports_inference(self) -> bool {
        self >= Self::Verbose
    }
}

/// Configuration passed to [`KnowledgeBase::with_config`](crate::KnowledgeBase::with_config).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KbConfig {
    /// Reporting level for `tracing` events.
    pub verbosity: Verbosity,
}

impl KbConfig {
    /// Config with the given verbosity.
    #[must_use]
    pub const fn with_verbosity(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    /// Config that reports nothing but diagnostics.
    #[must_use]
    pub const fn silent() -> Self {
        Self::with_verbosity(Verbosity::Silent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels_are_cumulative() {
        assert!(!Verbosity::Silent.reports_assertions());
        assert!(!Verbosity::Silent.reports_inference());
        assert!(Verbosity::Normal.reports_assertions());
        assert!(!Verbosity::Normal.reports_inference());
        assert!(Verbosity::Verbose.reports_assertions());
        assert!(Verbosity::Verbose.reports_inference());
    }

    #[test]
    fn default_config_is_normal() {
        assert_eq!(KbConfig::default().verbosity, Verbosity::Normal);
        assert_eq!(KbConfig::silent().verbosity, Verbosity::Silent);
    }
}
