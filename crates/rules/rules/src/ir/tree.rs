use std::collections::BTreeMap;
use std::fmt;

use bulwark_core::OperationType;

use super::logic::ShieldRule;
use super::rule::Rule;

/// Which rule guards which operation.
///
/// A tree is either a single rule guarding everything, or a map. Two map
/// shapes are understood by the dispatcher:
///
/// - flat: `{category: {operation: rule}}`, where every top-level key names
///   an [`OperationType`];
/// - namespaced: `{namespace: {category: {operation: rule}}}`.
///
/// ```
/// use bulwark_rules::{RuleTree, allow, deny};
///
/// let tree: RuleTree<()> = RuleTree::map([
///     ("query", RuleTree::map([("me", allow())])),
///     ("mutation", RuleTree::map([("createUser", deny())])),
/// ]);
/// assert!(tree.is_flat());
/// ```
pub enum RuleTree<C> {
    /// A rule at this position.
    Rule(ShieldRule<C>),
    /// Named sub-trees.
    Map(BTreeMap<String, RuleTree<C>>),
}

impl<C> RuleTree<C> {
    /// A tree consisting of a single rule.
    pub fn rule(rule: impl Into<ShieldRule<C>>) -> Self {
        Self::Rule(rule.into())
    }

    /// A tree built from `(key, sub-tree)` pairs.
    pub fn map<K, V, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<RuleTree<C>>,
    {
        entries.into_iter().collect()
    }

    /// The sub-tree stored under `key`, if this is a map.
    pub fn get(&self, key: &str) -> Option<&RuleTree<C>> {
        match self {
            Self::Rule(_) => None,
            Self::Map(entries) => entries.get(key),
        }
    }

    /// The rule at this position, if this is a leaf.
    pub fn as_rule(&self) -> Option<&ShieldRule<C>> {
        match self {
            Self::Rule(rule) => Some(rule),
            Self::Map(_) => None,
        }
    }

    /// Whether this is a map whose top-level keys are all operation categories.
    pub fn is_flat(&self) -> bool {
        match self {
            Self::Rule(_) => false,
            Self::Map(entries) => entries
                .keys()
                .all(|key| key.parse::<OperationType>().is_ok()),
        }
    }

    /// Whether some, but not all, top-level keys are operation categories.
    ///
    /// Such a tree is looked up as namespaced, so its category entries are
    /// unreachable.
    pub fn has_mixed_keys(&self) -> bool {
        match self {
            Self::Rule(_) => false,
            Self::Map(entries) => {
                let categories = entries
                    .keys()
                    .filter(|key| key.parse::<OperationType>().is_ok())
                    .count();
                categories > 0 && categories < entries.len()
            }
        }
    }
}

impl<C> Clone for RuleTree<C> {
    fn clone(&self) -> Self {
        match self {
            Self::Rule(rule) => Self::Rule(rule.clone()),
            Self::Map(entries) => Self::Map(entries.clone()),
        }
    }
}

impl<C> fmt::Debug for RuleTree<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rule(rule) => rule.fmt(f),
            Self::Map(entries) => f.debug_map().entries(entries).finish(),
        }
    }
}

impl<C> From<ShieldRule<C>> for RuleTree<C> {
    fn from(rule: ShieldRule<C>) -> Self {
        Self::Rule(rule)
    }
}

impl<C> From<Rule<C>> for RuleTree<C> {
    fn from(rule: Rule<C>) -> Self {
        Self::Rule(rule.into())
    }
}

impl<C, K, V> FromIterator<(K, V)> for RuleTree<C>
where
    K: Into<String>,
    V: Into<RuleTree<C>>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self::Map(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::constructors::{allow, deny};
    use crate::ir::logic::LogicKind;

    fn kind_at(tree: &RuleTree<()>, path: &[&str]) -> Option<LogicKind> {
        let mut node = tree;
        for key in path {
            node = node.get(key)?;
        }
        Some(node.as_rule()?.as_logic()?.kind())
    }

    #[test]
    fn flat_tree() {
        let tree: RuleTree<()> = RuleTree::map([
            ("query", RuleTree::map([("me", allow())])),
            ("mutation", RuleTree::map([("createUser", deny())])),
        ]);
        assert!(tree.is_flat());
        assert_eq!(kind_at(&tree, &["query", "me"]), Some(LogicKind::True));
        assert_eq!(
            kind_at(&tree, &["mutation", "createUser"]),
            Some(LogicKind::False)
        );
        assert_eq!(kind_at(&tree, &["mutation", "deleteUser"]), None);
    }

    #[test]
    fn namespaced_tree_is_not_flat() {
        let tree: RuleTree<()> = RuleTree::map([(
            "user",
            RuleTree::map([("query", RuleTree::map([("list", allow())]))]),
        )]);
        assert!(!tree.is_flat());
        assert_eq!(
            kind_at(&tree, &["user", "query", "list"]),
            Some(LogicKind::True)
        );
    }

    #[test]
    fn mixed_top_level_keys() {
        let mixed: RuleTree<()> = RuleTree::map([
            ("query", RuleTree::map([("me", allow())])),
            ("user", RuleTree::map([("query", RuleTree::map([("list", allow())]))])),
        ]);
        assert!(mixed.has_mixed_keys());
        assert!(!mixed.is_flat());

        let flat: RuleTree<()> = RuleTree::map([("query", RuleTree::map([("me", allow())]))]);
        assert!(!flat.has_mixed_keys());
        assert!(!RuleTree::rule(deny::<()>()).has_mixed_keys());
    }

    #[test]
    fn single_rule_tree() {
        let tree = RuleTree::rule(deny::<()>());
        assert!(!tree.is_flat());
        assert!(tree.get("query").is_none());
        assert_eq!(kind_at(&tree, &[]), Some(LogicKind::False));
    }
}
