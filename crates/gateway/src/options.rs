use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bulwark_core::{DEFAULT_DENIAL_MESSAGE, Denial, Operation};
use bulwark_rules::{EvalOptions, ShieldRule, allow};

/// Maps the denial a rule tree produced (if any) and the refused operation
/// to the denial surfaced to the caller.
pub type ErrorMapper<C> = Arc<dyn Fn(Option<&Denial>, &Operation<C>) -> Denial + Send + Sync>;

/// The error returned for a refused operation.
pub enum FallbackError<C> {
    /// Always the same denial.
    Static(Denial),
    /// Computed per refusal.
    ///
    /// The mapper is synchronous. Lookups that need to await belong in a
    /// predicate returning a [`Denial`], surfaced with
    /// `allow_external_errors`.
    Mapper(ErrorMapper<C>),
}

impl<C> FallbackError<C> {
    /// A fallback computed by `f`.
    pub fn mapper<F>(f: F) -> Self
    where
        F: Fn(Option<&Denial>, &Operation<C>) -> Denial + Send + Sync + 'static,
    {
        Self::Mapper(Arc::new(f))
    }

    /// The denial to return for `operation`, given the denial the rule tree
    /// carried.
    pub fn to_denial(&self, cause: Option<&Denial>, operation: &Operation<C>) -> Denial {
        match self {
            Self::Static(denial) => denial.clone(),
            Self::Mapper(mapper) => mapper(cause, operation),
        }
    }
}

impl<C> Default for FallbackError<C> {
    fn default() -> Self {
        Self::Static(Denial::new(DEFAULT_DENIAL_MESSAGE))
    }
}

impl<C> Clone for FallbackError<C> {
    fn clone(&self) -> Self {
        match self {
            Self::Static(denial) => Self::Static(denial.clone()),
            Self::Mapper(mapper) => Self::Mapper(Arc::clone(mapper)),
        }
    }
}

impl<C> fmt::Debug for FallbackError<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(denial) => f.debug_tuple("Static").field(denial).finish(),
            Self::Mapper(_) => f.write_str("Mapper(..)"),
        }
    }
}

impl<C> From<Denial> for FallbackError<C> {
    fn from(denial: Denial) -> Self {
        Self::Static(denial)
    }
}

impl<C> From<&str> for FallbackError<C> {
    fn from(message: &str) -> Self {
        Self::Static(Denial::new(message))
    }
}

impl<C> From<String> for FallbackError<C> {
    fn from(message: String) -> Self {
        Self::Static(Denial::new(message))
    }
}

/// Behavior switches for a [`Shield`](crate::Shield).
pub struct ShieldOptions<C> {
    /// Propagate rule failures to the caller instead of denying.
    pub debug: bool,
    /// Return the denial carried by the rule tree rather than the fallback error.
    pub allow_external_errors: bool,
    /// Rule applied to operations with no entry in the tree.
    pub fallback_rule: ShieldRule<C>,
    /// Error returned for refused operations.
    pub fallback_error: FallbackError<C>,
    /// Upper bound on a single predicate's run time.
    pub predicate_timeout: Option<Duration>,
}

impl<C> ShieldOptions<C> {
    /// The subset of options rule evaluation needs.
    pub fn eval_options(&self) -> EvalOptions {
        EvalOptions {
            debug: self.debug,
            predicate_timeout: self.predicate_timeout,
        }
    }
}

impl<C> Default for ShieldOptions<C> {
    fn default() -> Self {
        Self {
            debug: false,
            allow_external_errors: false,
            fallback_rule: allow(),
            fallback_error: FallbackError::default(),
            predicate_timeout: None,
        }
    }
}

impl<C> Clone for ShieldOptions<C> {
    fn clone(&self) -> Self {
        Self {
            debug: self.debug,
            allow_external_errors: self.allow_external_errors,
            fallback_rule: self.fallback_rule.clone(),
            fallback_error: self.fallback_error.clone(),
            predicate_timeout: self.predicate_timeout,
        }
    }
}

impl<C> fmt::Debug for ShieldOptions<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShieldOptions")
            .field("debug", &self.debug)
            .field("allow_external_errors", &self.allow_external_errors)
            .field("fallback_rule", &self.fallback_rule)
            .field("fallback_error", &self.fallback_error)
            .field("predicate_timeout", &self.predicate_timeout)
            .finish()
    }
}
