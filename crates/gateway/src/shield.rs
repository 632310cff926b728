use std::fmt;

use bulwark_core::{Denial, Operation};
use bulwark_rules::{RuleResult, RuleTree, ShieldRule, validate_rule_tree};
use tracing::{debug, info, instrument, warn};

use crate::builder::ShieldBuilder;
use crate::error::ShieldError;
use crate::metrics::ShieldMetrics;
use crate::options::ShieldOptions;

/// Authorization dispatcher.
///
/// A `Shield` owns a validated [`RuleTree`] and decides, per [`Operation`],
/// whether the caller's continuation may run. It holds no mutable state apart
/// from its metrics counters, so a single instance can be shared across tasks
/// behind an `Arc`.
pub struct Shield<C> {
    tree: RuleTree<C>,
    flat: bool,
    options: ShieldOptions<C>,
    metrics: ShieldMetrics,
}

impl<C> Shield<C> {
    /// Validate `tree` and create a shield enforcing it.
    pub fn new(tree: RuleTree<C>, options: ShieldOptions<C>) -> Result<Self, ShieldError> {
        validate_rule_tree(&tree)?;
        let flat = tree.is_flat();
        if tree.has_mixed_keys() {
            warn!("rule tree mixes categories and namespaces at the top level, category entries are unreachable");
        }
        debug!(flat, debug = options.debug, "shield constructed");
        Ok(Self {
            tree,
            flat,
            options,
            metrics: ShieldMetrics::default(),
        })
    }

    /// Start building a shield.
    pub fn builder() -> ShieldBuilder<C> {
        ShieldBuilder::new()
    }

    /// The options this shield was built with.
    pub fn options(&self) -> &ShieldOptions<C> {
        &self.options
    }

    /// The rule tree this shield enforces.
    pub fn tree(&self) -> &RuleTree<C> {
        &self.tree
    }

    /// Decision counters.
    pub fn metrics(&self) -> &ShieldMetrics {
        &self.metrics
    }

    /// The tree entry guarding `operation`, if there is one.
    ///
    /// A single-rule tree guards everything. A flat tree is indexed by
    /// category then operation name; any other map is indexed by namespace
    /// (leading path segment) first.
    pub fn lookup(&self, operation: &Operation<C>) -> Option<&ShieldRule<C>> {
        let category = operation.operation_type.as_str();
        let name = operation.name();
        let entry = match &self.tree {
            RuleTree::Rule(rule) => return Some(rule),
            RuleTree::Map(_) if self.flat => self.tree.get(category)?.get(name)?,
            RuleTree::Map(_) => self
                .tree
                .get(operation.namespace())?
                .get(category)?
                .get(name)?,
        };
        entry.as_rule()
    }

    /// The rule that decides `operation`: its tree entry, or the fallback rule.
    pub fn rule_for(&self, operation: &Operation<C>) -> &ShieldRule<C> {
        self.lookup(operation)
            .unwrap_or(&self.options.fallback_rule)
    }

    /// The denial returned to the caller for a refused operation.
    fn denial_for(&self, result: &RuleResult, operation: &Operation<C>) -> Denial {
        match result.denial() {
            Some(carried) if self.options.allow_external_errors => carried.clone(),
            cause => self.options.fallback_error.to_denial(cause, operation),
        }
    }
}

impl<C: Send + Sync + 'static> Shield<C> {
    /// Resolve the rule guarding `operation`.
    ///
    /// Only fails when debug mode is on and a predicate fails.
    pub async fn authorize(&self, operation: &Operation<C>) -> Result<RuleResult, ShieldError> {
        let rule = match self.lookup(operation) {
            Some(rule) => rule,
            None => {
                self.metrics.increment_fallbacks();
                debug!(path = %operation.path, "no rule for operation, using fallback");
                &self.options.fallback_rule
            }
        };

        rule.resolve(operation, self.options.eval_options())
            .await
            .map_err(|err| {
                self.metrics.increment_errors();
                warn!(path = %operation.path, error = %err, "rule evaluation failed");
                ShieldError::Rule(err)
            })
    }

    /// Decide `operation` without running anything.
    ///
    /// Returns `Ok(())` when authorized and [`ShieldError::Denied`] otherwise.
    pub async fn check(&self, operation: &Operation<C>) -> Result<(), ShieldError> {
        let result = self.authorize(operation).await?;
        if result.is_authorized() {
            self.metrics.increment_allowed();
            debug!(path = %operation.path, "operation authorized");
            return Ok(());
        }

        self.metrics.increment_denied();
        let denial = self.denial_for(&result, operation);
        info!(
            path = %operation.path,
            result = result.as_str(),
            reason = %denial,
            "operation denied"
        );
        Err(ShieldError::Denied(denial))
    }

    /// Run `next` if `operation` is authorized.
    ///
    /// On refusal `next` is never called and [`ShieldError::Denied`] is
    /// returned. In debug mode a failing predicate aborts with
    /// [`ShieldError::Rule`].
    #[instrument(
        name = "shield.dispatch",
        skip_all,
        fields(
            operation.operation_type = %operation.operation_type,
            operation.path = %operation.path,
        )
    )]
    pub async fn dispatch<F, Fut, T>(&self, operation: Operation<C>, next: F) -> Result<T, ShieldError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.metrics.increment_dispatched();
        self.check(&operation).await?;
        Ok(next().await)
    }
}

impl<C> fmt::Debug for Shield<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shield")
            .field("tree", &self.tree)
            .field("flat", &self.flat)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
