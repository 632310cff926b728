use std::time::Duration;

/// Settings that influence how individual rules are resolved.
///
/// This is the part of the engine options that rule evaluation needs; it is
/// `Copy` so that it can be threaded through nested combinators freely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvalOptions {
    /// Propagate predicate failures instead of treating them as denials.
    pub debug: bool,
    /// Upper bound on the time a single predicate may take.
    ///
    /// A predicate that exceeds it counts as a failed predicate.
    pub predicate_timeout: Option<Duration>,
}

impl EvalOptions {
    /// Options with debug disabled and no predicate deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set debug mode.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Set the per-predicate deadline.
    #[must_use]
    pub fn with_predicate_timeout(mut self, timeout: Duration) -> Self {
        self.predicate_timeout = Some(timeout);
        self
    }
}
