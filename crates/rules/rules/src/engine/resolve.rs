//! Resolution of rules against an operation.
//!
//! Leaf rules run their predicate; logic rules first `evaluate` their
//! children according to the combinator's scheduling policy and then reduce
//! the collected results in `resolve`.

use bulwark_core::Operation;
use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use tracing::{debug, trace};

use crate::engine::options::EvalOptions;
use crate::engine::result::RuleResult;
use crate::error::RuleError;
use crate::ir::logic::{LogicKind, LogicRule, ShieldRule};
use crate::ir::rule::Rule;

impl<C: Send + Sync + 'static> Rule<C> {
    /// Run the predicate and normalize its outcome.
    ///
    /// A failing or timed-out predicate is reported as an error in debug mode
    /// and as [`RuleResult::Denied`] otherwise.
    pub async fn resolve(
        &self,
        operation: &Operation<C>,
        options: EvalOptions,
    ) -> Result<RuleResult, RuleError> {
        let outcome = match options.predicate_timeout {
            Some(limit) => {
                match tokio::time::timeout(limit, self.predicate.check(operation)).await {
                    Ok(checked) => checked.map_err(|source| self.failure(source)),
                    Err(_) => Err(RuleError::Timeout {
                        rule: self.name().to_owned(),
                        limit,
                    }),
                }
            }
            None => self
                .predicate
                .check(operation)
                .await
                .map_err(|source| self.failure(source)),
        };

        match outcome {
            Ok(result) => {
                trace!(rule = %self.name(), result = result.as_str(), "rule resolved");
                Ok(result)
            }
            Err(err) if options.debug => Err(err),
            Err(err) => {
                debug!(rule = %self.name(), error = %err, "rule failed, denying");
                Ok(RuleResult::Denied)
            }
        }
    }

    fn failure(&self, source: crate::error::PredicateError) -> RuleError {
        RuleError::Predicate {
            rule: self.name().to_owned(),
            source,
        }
    }
}

impl<C: Send + Sync + 'static> LogicRule<C> {
    /// Resolve the children this combinator schedules, in child order.
    ///
    /// `And`, `Or` and `Not` poll every child concurrently and wait for all
    /// of them. `Chain` stops after the first child that does not authorize,
    /// `Race` after the first that does; later children are never started.
    pub async fn evaluate(
        &self,
        operation: &Operation<C>,
        options: EvalOptions,
    ) -> Result<Vec<RuleResult>, RuleError> {
        match self.kind() {
            LogicKind::And | LogicKind::Or | LogicKind::Not => {
                let outcomes = join_all(
                    self.children()
                        .iter()
                        .map(|child| child.resolve(operation, options)),
                )
                .await;
                outcomes.into_iter().collect()
            }
            LogicKind::Chain => self.evaluate_until(operation, options, false).await,
            LogicKind::Race => self.evaluate_until(operation, options, true).await,
            LogicKind::True | LogicKind::False => Ok(Vec::new()),
        }
    }

    /// Resolve children one at a time until one's authorization equals `stop_on`.
    async fn evaluate_until(
        &self,
        operation: &Operation<C>,
        options: EvalOptions,
        stop_on: bool,
    ) -> Result<Vec<RuleResult>, RuleError> {
        let mut results = Vec::with_capacity(self.children().len());
        for child in self.children() {
            let result = child.resolve(operation, options).await?;
            let stop = result.is_authorized() == stop_on;
            results.push(result);
            if stop {
                break;
            }
        }
        Ok(results)
    }

    /// Evaluate the children and reduce them to a single result.
    pub async fn resolve(
        &self,
        operation: &Operation<C>,
        options: EvalOptions,
    ) -> Result<RuleResult, RuleError> {
        let kind = self.kind();
        let result = match kind {
            LogicKind::True => RuleResult::Authorized,
            LogicKind::False => RuleResult::Denied,
            LogicKind::And | LogicKind::Or | LogicKind::Not | LogicKind::Chain | LogicKind::Race => {
                let results = self.evaluate(operation, options).await?;
                self.reduce(results)
            }
        };
        trace!(%kind, result = result.as_str(), "logic rule resolved");
        Ok(result)
    }

    fn reduce(&self, results: Vec<RuleResult>) -> RuleResult {
        match self.kind() {
            LogicKind::And => {
                if results.iter().all(RuleResult::is_authorized) {
                    RuleResult::Authorized
                } else {
                    RuleResult::first_failure(results)
                }
            }
            LogicKind::Or => {
                if results.iter().any(RuleResult::is_authorized) {
                    RuleResult::Authorized
                } else {
                    RuleResult::first_failure(results)
                }
            }
            // Only the stopping child can be non-authorized.
            LogicKind::Chain => results
                .into_iter()
                .find(|result| !result.is_authorized())
                .unwrap_or(RuleResult::Authorized),
            LogicKind::Race => {
                if results.iter().any(RuleResult::is_authorized) {
                    RuleResult::Authorized
                } else {
                    RuleResult::first_failure(results.into_iter().rev())
                }
            }
            LogicKind::Not => match results.first() {
                Some(RuleResult::Authorized) => self
                    .error()
                    .cloned()
                    .map_or(RuleResult::Denied, RuleResult::DeniedWithError),
                _ => RuleResult::Authorized,
            },
            LogicKind::True => RuleResult::Authorized,
            LogicKind::False => RuleResult::Denied,
        }
    }
}

impl<C: Send + Sync + 'static> ShieldRule<C> {
    /// Resolve this node against the operation.
    pub fn resolve<'a>(
        &'a self,
        operation: &'a Operation<C>,
        options: EvalOptions,
    ) -> BoxFuture<'a, Result<RuleResult, RuleError>> {
        match self {
            Self::Rule(rule) => rule.resolve(operation, options).boxed(),
            Self::Logic(logic) => logic.resolve(operation, options).boxed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use bulwark_core::{Denial, OperationType};

    use super::*;
    use crate::ir::constructors::{allow, and, chain, deny, not, not_with, or, race, rule};

    fn op() -> Operation<()> {
        Operation::new(Arc::new(()), OperationType::Query, "user.me")
    }

    /// A rule returning `result` that counts its invocations.
    fn counted(name: &str, result: RuleResult) -> (ShieldRule<()>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let rule = rule(name, move |_op: Operation<()>| {
            counter.fetch_add(1, Ordering::SeqCst);
            let result = result.clone();
            async move { result }
        });
        (rule.into(), calls)
    }

    fn failing(name: &str, message: &'static str) -> ShieldRule<()> {
        rule(name, move |_op: Operation<()>| async move {
            Err::<bool, _>(message)
        })
        .into()
    }

    /// A rule that sleeps for one second before returning `result`.
    fn sleepy(name: &str, result: RuleResult) -> ShieldRule<()> {
        rule(name, move |_op: Operation<()>| {
            let result = result.clone();
            async move {
                tokio::time::sleep(Duration::from_secs(1)).await;
                result
            }
        })
        .into()
    }

    /// Assert that about `secs` seconds of (paused) time passed since `start`.
    fn assert_secs(start: tokio::time::Instant, secs: u64) {
        let elapsed = start.elapsed();
        assert!(
            elapsed >= Duration::from_secs(secs)
                && elapsed < Duration::from_secs(secs) + Duration::from_millis(100),
            "expected ~{secs}s, took {elapsed:?}"
        );
    }

    fn with_error(message: &str) -> RuleResult {
        RuleResult::DeniedWithError(Denial::new(message))
    }

    async fn resolve(node: &ShieldRule<()>) -> RuleResult {
        node.resolve(&op(), EvalOptions::default()).await.unwrap()
    }

    // --- Constants ---

    #[tokio::test]
    async fn constants_ignore_input() {
        assert_eq!(resolve(&allow()).await, RuleResult::Authorized);
        assert_eq!(resolve(&deny()).await, RuleResult::Denied);

        let with_input = op().with_input(serde_json::json!({"admin": true}));
        let result = deny::<()>()
            .resolve(&with_input, EvalOptions::default())
            .await
            .unwrap();
        assert_eq!(result, RuleResult::Denied);
    }

    // --- Leaf rules ---

    #[tokio::test]
    async fn leaf_reads_context_and_input() {
        struct Session {
            user: &'static str,
        }
        let owner = rule("is_owner", |op: Operation<Session>| async move {
            op.input["owner"] == op.ctx.user
        });
        let operation = Operation::new(
            Arc::new(Session { user: "ada" }),
            OperationType::Mutation,
            "post.update",
        )
        .with_input(serde_json::json!({"owner": "ada"}));
        let result = owner
            .resolve(&operation, EvalOptions::default())
            .await
            .unwrap();
        assert_eq!(result, RuleResult::Authorized);
    }

    #[tokio::test]
    async fn failing_predicate_denies_outside_debug() {
        let node = failing("broken", "boom");
        assert_eq!(resolve(&node).await, RuleResult::Denied);
    }

    #[tokio::test]
    async fn failing_predicate_propagates_in_debug() {
        let node = failing("broken", "boom");
        let err = node
            .resolve(&op(), EvalOptions::new().with_debug(true))
            .await
            .unwrap_err();
        assert!(matches!(err, RuleError::Predicate { ref rule, .. } if rule == "broken"));
        assert_eq!(err.source().unwrap().to_string(), "boom");
    }

    #[tokio::test(start_paused = true)]
    async fn slow_predicate_times_out() {
        let slow: ShieldRule<()> = rule("slow", |_op: Operation<()>| async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            true
        })
        .into();
        let limit = Duration::from_secs(1);

        let options = EvalOptions::new().with_predicate_timeout(limit);
        let result = slow.resolve(&op(), options).await.unwrap();
        assert_eq!(result, RuleResult::Denied);

        let err = slow
            .resolve(&op(), options.with_debug(true))
            .await
            .unwrap_err();
        assert!(matches!(err, RuleError::Timeout { limit: l, .. } if l == limit));
    }

    #[tokio::test(start_paused = true)]
    async fn fast_predicate_within_deadline() {
        let node: ShieldRule<()> = rule("fast", |_op: Operation<()>| async { true }).into();
        let options = EvalOptions::new().with_predicate_timeout(Duration::from_millis(50));
        assert_eq!(
            node.resolve(&op(), options).await.unwrap(),
            RuleResult::Authorized
        );
    }

    // --- And / Or ---

    #[tokio::test]
    async fn and_requires_every_child() {
        assert_eq!(resolve(&and([allow(), allow()])).await, RuleResult::Authorized);
        assert_eq!(resolve(&and([allow(), deny()])).await, RuleResult::Denied);
    }

    #[tokio::test]
    async fn and_error_outranks_plain_denial() {
        let (reason, _) = counted("reason", with_error("x"));
        let node = and([deny(), reason]);
        assert_eq!(resolve(&node).await, with_error("x"));
    }

    #[tokio::test]
    async fn and_runs_every_child() {
        let (first, first_calls) = counted("first", RuleResult::Denied);
        let (second, second_calls) = counted("second", RuleResult::Authorized);
        let node = and([first, second]);
        assert_eq!(resolve(&node).await, RuleResult::Denied);
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(second_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn and_first_error_in_child_order() {
        let (a, _) = counted("a", with_error("first"));
        let (b, _) = counted("b", with_error("second"));
        assert_eq!(resolve(&and([a, b])).await, with_error("first"));
    }

    #[tokio::test]
    async fn and_swallows_failure_as_denial() {
        let node = and([allow(), failing("broken", "boom")]);
        assert_eq!(resolve(&node).await, RuleResult::Denied);
    }

    #[tokio::test]
    async fn and_in_debug_runs_all_then_fails() {
        let (after, after_calls) = counted("after", RuleResult::Authorized);
        let node = and([failing("broken", "boom"), after]);
        let err = node
            .resolve(&op(), EvalOptions::new().with_debug(true))
            .await
            .unwrap_err();
        assert_eq!(err.rule_name(), "broken");
        assert_eq!(after_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn or_needs_one_child() {
        let (late, late_calls) = counted("late", RuleResult::Denied);
        let node = or([allow(), late]);
        assert_eq!(resolve(&node).await, RuleResult::Authorized);
        assert_eq!(late_calls.load(Ordering::SeqCst), 1);

        let (reason, _) = counted("reason", with_error("nope"));
        assert_eq!(resolve(&or([deny(), reason])).await, with_error("nope"));
        assert_eq!(resolve(&or([deny(), deny()])).await, RuleResult::Denied);
    }

    #[tokio::test]
    async fn empty_combinators() {
        let none = || Vec::<ShieldRule<()>>::new();
        assert_eq!(resolve(&and(none())).await, RuleResult::Authorized);
        assert_eq!(resolve(&chain(none())).await, RuleResult::Authorized);
        assert_eq!(resolve(&or(none())).await, RuleResult::Denied);
        assert_eq!(resolve(&race(none())).await, RuleResult::Denied);
    }

    // --- Chain / Race ---

    #[tokio::test]
    async fn chain_stops_at_first_refusal() {
        let (r1, c1) = counted("r1", RuleResult::Denied);
        let (r2, c2) = counted("r2", RuleResult::Authorized);
        let (r3, c3) = counted("r3", RuleResult::Authorized);
        let node = chain([r1, r2, r3]);

        assert_eq!(resolve(&node).await, RuleResult::Denied);
        assert_eq!(c1.load(Ordering::SeqCst), 1);
        assert_eq!(c2.load(Ordering::SeqCst), 0);
        assert_eq!(c3.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn chain_reports_stopping_error() {
        let (r2, _) = counted("r2", with_error("second"));
        let (r3, c3) = counted("r3", with_error("third"));
        let node = chain([allow(), r2, r3]);
        assert_eq!(resolve(&node).await, with_error("second"));
        assert_eq!(c3.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn chain_evaluate_lists_attempted() {
        let (r2, _) = counted("r2", RuleResult::Denied);
        let node = chain([allow(), r2, allow()]);
        let logic = node.as_logic().unwrap();
        let results = logic.evaluate(&op(), EvalOptions::default()).await.unwrap();
        assert_eq!(results, vec![RuleResult::Authorized, RuleResult::Denied]);
    }

    #[tokio::test]
    async fn race_stops_at_first_authorization() {
        let (r1, c1) = counted("r1", RuleResult::Denied);
        let (r2, c2) = counted("r2", RuleResult::Authorized);
        let (r3, c3) = counted("r3", RuleResult::Authorized);
        let node = race([r1, r2, r3]);

        assert_eq!(resolve(&node).await, RuleResult::Authorized);
        assert_eq!(c1.load(Ordering::SeqCst), 1);
        assert_eq!(c2.load(Ordering::SeqCst), 1);
        assert_eq!(c3.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn race_reports_last_error() {
        let (a, _) = counted("a", with_error("first"));
        let (c, _) = counted("c", with_error("last"));
        let node = race([a, deny(), c, deny()]);
        assert_eq!(resolve(&node).await, with_error("last"));
        assert_eq!(resolve(&race([deny(), deny()])).await, RuleResult::Denied);
    }

    #[tokio::test]
    async fn chain_in_debug_aborts_before_later_children() {
        let (after, after_calls) = counted("after", RuleResult::Authorized);
        let node = chain([allow(), failing("broken", "boom"), after]);
        let err = node
            .resolve(&op(), EvalOptions::new().with_debug(true))
            .await
            .unwrap_err();
        assert_eq!(err.rule_name(), "broken");
        assert_eq!(after_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn race_in_debug_aborts_before_later_children() {
        let (after, after_calls) = counted("after", RuleResult::Authorized);
        let node = race([deny(), failing("broken", "boom"), after]);
        let err = node
            .resolve(&op(), EvalOptions::new().with_debug(true))
            .await
            .unwrap_err();
        assert!(matches!(err, RuleError::Predicate { ref rule, .. } if rule == "broken"));
        assert_eq!(after_calls.load(Ordering::SeqCst), 0);
    }

    // --- Scheduling ---

    #[tokio::test(start_paused = true)]
    async fn and_or_run_children_concurrently() {
        let start = tokio::time::Instant::now();
        let node = and([
            sleepy("a1", RuleResult::Authorized),
            sleepy("a2", RuleResult::Authorized),
            sleepy("a3", RuleResult::Authorized),
        ]);
        assert_eq!(resolve(&node).await, RuleResult::Authorized);
        assert_secs(start, 1);

        let start = tokio::time::Instant::now();
        let node = or([
            sleepy("o1", RuleResult::Denied),
            sleepy("o2", RuleResult::Denied),
            sleepy("o3", RuleResult::Denied),
        ]);
        assert_eq!(resolve(&node).await, RuleResult::Denied);
        assert_secs(start, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn chain_race_run_children_in_sequence() {
        let start = tokio::time::Instant::now();
        let node = race([sleepy("r1", RuleResult::Denied), sleepy("r2", RuleResult::Denied)]);
        assert_eq!(resolve(&node).await, RuleResult::Denied);
        assert_secs(start, 2);

        let start = tokio::time::Instant::now();
        let node = chain([
            sleepy("c1", RuleResult::Authorized),
            sleepy("c2", RuleResult::Authorized),
            sleepy("c3", RuleResult::Authorized),
        ]);
        assert_eq!(resolve(&node).await, RuleResult::Authorized);
        assert_secs(start, 3);
    }

    // --- Not ---

    #[tokio::test]
    async fn not_negates() {
        assert_eq!(resolve(&not(allow())).await, RuleResult::Denied);
        assert_eq!(resolve(&not(deny())).await, RuleResult::Authorized);
        assert_eq!(
            resolve(&not_with(allow(), "already signed in")).await,
            with_error("already signed in")
        );
        assert_eq!(
            resolve(&not_with(deny(), "unused")).await,
            RuleResult::Authorized
        );
    }

    #[tokio::test]
    async fn not_drops_child_error() {
        let (reason, _) = counted("reason", with_error("child"));
        assert_eq!(resolve(&not(reason)).await, RuleResult::Authorized);
    }

    // --- Nesting ---

    #[tokio::test]
    async fn shared_subtree_runs_at_each_position() {
        let (shared, calls) = counted("shared", RuleResult::Authorized);
        let sub = and([shared.clone(), allow()]);
        let node = or([sub.clone(), sub]);
        assert_eq!(resolve(&node).await, RuleResult::Authorized);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn nested_combinators() {
        let (reason, _) = counted("reason", with_error("not a member"));
        let node = chain([
            or([deny(), allow()]),
            and([allow(), not(deny())]),
            race([deny(), reason]),
        ]);
        assert_eq!(resolve(&node).await, with_error("not a member"));
    }
}
