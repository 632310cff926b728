use std::time::Duration;

use bulwark_core::{Denial, Operation};
use bulwark_rules::{RuleTree, ShieldRule};

use crate::config::ShieldConfig;
use crate::error::ShieldError;
use crate::options::{FallbackError, ShieldOptions};
use crate::shield::Shield;

/// Fluent builder for constructing a [`Shield`] instance.
///
/// Every option has a default (debug off, external errors hidden, allow
/// unlisted operations, `"Not Authorised!"`), so only the rule tree passed to
/// [`build`](Self::build) is required.
pub struct ShieldBuilder<C> {
    options: ShieldOptions<C>,
}

impl<C> ShieldBuilder<C> {
    /// Create a new builder with all options set to their defaults.
    pub fn new() -> Self {
        Self {
            options: ShieldOptions::default(),
        }
    }

    /// Create a builder seeded from a declarative config.
    pub fn from_config(config: ShieldConfig) -> Self {
        Self {
            options: config.into_options(),
        }
    }

    /// Replace all options at once.
    #[must_use]
    pub fn options(mut self, options: ShieldOptions<C>) -> Self {
        self.options = options;
        self
    }

    /// Propagate rule failures instead of denying.
    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.options.debug = debug;
        self
    }

    /// Surface denials carried by rules to the caller.
    #[must_use]
    pub fn allow_external_errors(mut self, allow: bool) -> Self {
        self.options.allow_external_errors = allow;
        self
    }

    /// Set the rule applied to operations with no tree entry.
    #[must_use]
    pub fn fallback_rule(mut self, rule: impl Into<ShieldRule<C>>) -> Self {
        self.options.fallback_rule = rule.into();
        self
    }

    /// Set the error returned for refused operations.
    #[must_use]
    pub fn fallback_error(mut self, error: impl Into<FallbackError<C>>) -> Self {
        self.options.fallback_error = error.into();
        self
    }

    /// Compute the error for refused operations with `f`.
    ///
    /// `f` receives the denial carried by the rule tree, if any, and the
    /// refused operation.
    #[must_use]
    pub fn fallback_error_mapper<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<&Denial>, &Operation<C>) -> Denial + Send + Sync + 'static,
    {
        self.options.fallback_error = FallbackError::mapper(f);
        self
    }

    /// Bound the run time of every predicate.
    #[must_use]
    pub fn predicate_timeout(mut self, timeout: Duration) -> Self {
        self.options.predicate_timeout = Some(timeout);
        self
    }

    /// Validate `tree` and build the [`Shield`].
    ///
    /// Returns [`ShieldError::Validation`] if two different rules share a name.
    pub fn build(self, tree: impl Into<RuleTree<C>>) -> Result<Shield<C>, ShieldError> {
        Shield::new(tree.into(), self.options)
    }
}

impl<C> Default for ShieldBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}
