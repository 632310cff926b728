use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bulwark_core::Operation;

use crate::engine::result::{IntoRuleResult, RuleResult};
use crate::error::PredicateError;

static NEXT_RULE_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a rule, assigned once when the rule is created.
///
/// Clones of a [`Rule`] share its id; two rules built separately never do,
/// even if they wrap the same function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(u64);

impl RuleId {
    fn next() -> Self {
        Self(NEXT_RULE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw numeric value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A check performed against an operation.
///
/// Implement this directly for stateful checks; plain async closures are
/// accepted through [`FnPredicate`].
#[async_trait]
pub trait Predicate<C>: Send + Sync {
    /// Decide on the operation. An `Err` means the check itself failed.
    async fn check(&self, operation: &Operation<C>) -> Result<RuleResult, PredicateError>;
}

/// Adapts an async closure into a [`Predicate`].
pub struct FnPredicate<F>(pub F);

#[async_trait]
impl<C, F, Fut, O> Predicate<C> for FnPredicate<F>
where
    C: Send + Sync + 'static,
    F: Fn(Operation<C>) -> Fut + Send + Sync,
    Fut: Future<Output = O> + Send,
    O: IntoRuleResult,
{
    async fn check(&self, operation: &Operation<C>) -> Result<RuleResult, PredicateError> {
        (self.0)(operation.clone()).await.into_rule_result()
    }
}

/// A named leaf rule wrapping a predicate.
pub struct Rule<C> {
    id: RuleId,
    name: Arc<str>,
    pub(crate) predicate: Arc<dyn Predicate<C>>,
}

impl<C> Rule<C> {
    /// Create a rule from any [`Predicate`] implementation.
    pub fn new(name: impl Into<String>, predicate: impl Predicate<C> + 'static) -> Self {
        Self {
            id: RuleId::next(),
            name: Arc::from(name.into()),
            predicate: Arc::new(predicate),
        }
    }

    /// Create a rule with a generated, unique name (`rule-<id>`).
    pub fn anonymous(predicate: impl Predicate<C> + 'static) -> Self {
        let id = RuleId::next();
        Self {
            id,
            name: Arc::from(format!("rule-{id}")),
            predicate: Arc::new(predicate),
        }
    }

    /// The rule's identity.
    pub fn id(&self) -> RuleId {
        self.id
    }

    /// The rule's display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether `other` is the same rule (same identity, not merely same name).
    pub fn same_as(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<C: Send + Sync + 'static> Rule<C> {
    /// Create a rule from an async closure.
    ///
    /// ```
    /// use bulwark_rules::{Operation, Rule};
    ///
    /// struct Session {
    ///     admin: bool,
    /// }
    ///
    /// let is_admin: Rule<Session> =
    ///     Rule::from_fn("is_admin", |op: Operation<Session>| async move { op.ctx.admin });
    /// assert_eq!(is_admin.name(), "is_admin");
    /// ```
    pub fn from_fn<F, Fut, O>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Operation<C>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = O> + Send,
        O: IntoRuleResult,
    {
        Self::new(name, FnPredicate(f))
    }
}

// Manual impls: neither should require bounds on `C`.
impl<C> Clone for Rule<C> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            name: Arc::clone(&self.name),
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<C> fmt::Debug for Rule<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
