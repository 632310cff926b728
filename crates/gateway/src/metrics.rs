use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters tracking shield decisions.
///
/// All counters use relaxed ordering. For a consistent point-in-time view,
/// call [`snapshot`](Self::snapshot).
#[derive(Debug, Default)]
pub struct ShieldMetrics {
    /// Operations passed to `dispatch`.
    pub dispatched: AtomicU64,
    /// Operations that were authorized.
    pub allowed: AtomicU64,
    /// Operations that were refused.
    pub denied: AtomicU64,
    /// Evaluations aborted by a rule error (debug mode only).
    pub errors: AtomicU64,
    /// Operations with no tree entry, resolved with the fallback rule.
    pub fallbacks: AtomicU64,
}

impl ShieldMetrics {
    /// Increment the dispatched counter.
    pub fn increment_dispatched(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the allowed counter.
    pub fn increment_allowed(&self) {
        self.allowed.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the denied counter.
    pub fn increment_denied(&self) {
        self.denied.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the errors counter.
    pub fn increment_errors(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the fallbacks counter.
    pub fn increment_fallbacks(&self) {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            allowed: self.allowed.load(Ordering::Relaxed),
            denied: self.denied.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
        }
    }
}

/// A plain data snapshot of [`ShieldMetrics`] at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Operations passed to `dispatch`.
    pub dispatched: u64,
    /// Operations that were authorized.
    pub allowed: u64,
    /// Operations that were refused.
    pub denied: u64,
    /// Evaluations aborted by a rule error.
    pub errors: u64,
    /// Operations resolved with the fallback rule.
    pub fallbacks: u64,
}
