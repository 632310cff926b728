use std::time::Duration;

use thiserror::Error;

/// Error type returned by a failing predicate.
pub type PredicateError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can escape rule evaluation.
///
/// Outside of debug mode these are contained by the failing rule and turned
/// into a plain denial, so callers only observe them when debugging.
#[derive(Debug, Error)]
pub enum RuleError {
    /// A predicate returned an error.
    #[error("rule '{rule}' failed: {source}")]
    Predicate {
        /// Name of the rule whose predicate failed.
        rule: String,
        /// The error produced by the predicate.
        source: PredicateError,
    },

    /// A predicate did not complete within the configured deadline.
    #[error("rule '{rule}' timed out after {limit:?}")]
    Timeout {
        /// Name of the rule that timed out.
        rule: String,
        /// The deadline that was exceeded.
        limit: Duration,
    },
}

impl RuleError {
    /// Name of the rule that produced the error.
    pub fn rule_name(&self) -> &str {
        match self {
            Self::Predicate { rule, .. } | Self::Timeout { rule, .. } => rule,
        }
    }
}

/// A rule tree reuses one rule name for rules with different identities.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("There seem to be multiple definitions of these rules: {}", .names.join(", "))]
pub struct ValidationError {
    names: Vec<String>,
}

impl ValidationError {
    pub(crate) fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// The conflicting rule names, each listed once, in tree order.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}
