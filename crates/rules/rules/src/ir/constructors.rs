//! Shorthand constructors for building rule trees.
//!
//! ```
//! use bulwark_rules::{Operation, ShieldRule, and, not, or, rule};
//!
//! struct Session {
//!     user: Option<String>,
//!     roles: Vec<String>,
//! }
//!
//! let signed_in = rule("signed_in", |op: Operation<Session>| async move {
//!     op.ctx.user.is_some()
//! });
//! let is_admin = rule("is_admin", |op: Operation<Session>| async move {
//!     op.ctx.roles.iter().any(|r| r == "admin")
//! });
//!
//! let policy: ShieldRule<Session> = or([
//!     is_admin.into(),
//!     and([signed_in.clone().into(), not(signed_in)]),
//! ]);
//! ```

use std::future::Future;

use bulwark_core::{Denial, Operation};

use super::logic::{LogicKind, LogicRule, ShieldRule};
use super::rule::{FnPredicate, Rule};
use crate::engine::result::IntoRuleResult;

/// Wrap an async closure into a named [`Rule`].
pub fn rule<C, F, Fut, O>(name: impl Into<String>, f: F) -> Rule<C>
where
    C: Send + Sync + 'static,
    F: Fn(Operation<C>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = O> + Send,
    O: IntoRuleResult,
{
    Rule::from_fn(name, f)
}

/// Wrap an async closure into a [`Rule`] with a generated unique name.
pub fn anonymous_rule<C, F, Fut, O>(f: F) -> Rule<C>
where
    C: Send + Sync + 'static,
    F: Fn(Operation<C>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = O> + Send,
    O: IntoRuleResult,
{
    Rule::anonymous(FnPredicate(f))
}

fn logic<C, I>(kind: LogicKind, rules: I, error: Option<Denial>) -> ShieldRule<C>
where
    I: IntoIterator,
    I::Item: Into<ShieldRule<C>>,
{
    LogicRule::new(kind, rules.into_iter().map(Into::into).collect(), error).into()
}

/// Authorize when every rule authorizes. All rules are evaluated.
pub fn and<C, I>(rules: I) -> ShieldRule<C>
where
    I: IntoIterator,
    I::Item: Into<ShieldRule<C>>,
{
    logic(LogicKind::And, rules, None)
}

/// Authorize when at least one rule authorizes. All rules are evaluated.
pub fn or<C, I>(rules: I) -> ShieldRule<C>
where
    I: IntoIterator,
    I::Item: Into<ShieldRule<C>>,
{
    logic(LogicKind::Or, rules, None)
}

/// Evaluate rules in order, stopping at the first that does not authorize.
pub fn chain<C, I>(rules: I) -> ShieldRule<C>
where
    I: IntoIterator,
    I::Item: Into<ShieldRule<C>>,
{
    logic(LogicKind::Chain, rules, None)
}

/// Evaluate rules in order, stopping at the first that authorizes.
pub fn race<C, I>(rules: I) -> ShieldRule<C>
where
    I: IntoIterator,
    I::Item: Into<ShieldRule<C>>,
{
    logic(LogicKind::Race, rules, None)
}

/// Negate a rule.
pub fn not<C>(rule: impl Into<ShieldRule<C>>) -> ShieldRule<C> {
    logic(LogicKind::Not, [rule.into()], None)
}

/// Negate a rule, denying with `error` when the wrapped rule authorizes.
pub fn not_with<C>(rule: impl Into<ShieldRule<C>>, error: impl Into<Denial>) -> ShieldRule<C> {
    logic(LogicKind::Not, [rule.into()], Some(error.into()))
}

/// A rule that always authorizes.
pub fn allow<C>() -> ShieldRule<C> {
    logic(LogicKind::True, Vec::<ShieldRule<C>>::new(), None)
}

/// A rule that always denies.
pub fn deny<C>() -> ShieldRule<C> {
    logic(LogicKind::False, Vec::<ShieldRule<C>>::new(), None)
}
