//! Detection of conflicting rule names in a rule tree.
//!
//! Rule names show up in logs and traces, so two different rules sharing a
//! name make a policy ambiguous to debug. A tree is valid when every name
//! maps to exactly one rule identity.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use tracing::warn;

use crate::error::ValidationError;
use crate::ir::logic::ShieldRule;
use crate::ir::rule::{Rule, RuleId};
use crate::ir::tree::RuleTree;

enum Pending<'a, C> {
    Tree(&'a RuleTree<C>),
    Node(&'a ShieldRule<C>),
}

/// Collect every leaf rule in the tree, left to right.
///
/// Descends through maps and logic rules with an explicit stack, so deep or
/// wide trees do not grow the call stack. A shared sub-policy is listed once
/// per position it occupies.
pub fn flatten_rules<C>(tree: &RuleTree<C>) -> Vec<&Rule<C>> {
    let mut stack = vec![Pending::Tree(tree)];
    let mut rules = Vec::new();

    while let Some(pending) = stack.pop() {
        let node = match pending {
            Pending::Tree(RuleTree::Map(entries)) => {
                stack.extend(entries.values().rev().map(Pending::Tree));
                continue;
            }
            Pending::Tree(RuleTree::Rule(node)) => node,
            Pending::Node(node) => node,
        };
        match node {
            ShieldRule::Rule(rule) => rules.push(rule),
            ShieldRule::Logic(logic) => {
                stack.extend(logic.children().iter().rev().map(Pending::Node));
            }
        }
    }

    rules
}

/// Check that no two distinct rules in the tree share a name.
///
/// Reusing the very same rule (or a clone of it) in several places is fine.
/// Each conflicting name is reported once.
pub fn validate_rule_tree<C>(tree: &RuleTree<C>) -> Result<(), ValidationError> {
    let mut seen: HashMap<&str, RuleId> = HashMap::new();
    let mut duplicates: Vec<String> = Vec::new();

    for rule in flatten_rules(tree) {
        match seen.entry(rule.name()) {
            Entry::Vacant(slot) => {
                slot.insert(rule.id());
            }
            Entry::Occupied(slot) => {
                if *slot.get() != rule.id() && !duplicates.iter().any(|name| name == rule.name()) {
                    duplicates.push(rule.name().to_owned());
                }
            }
        }
    }

    if duplicates.is_empty() {
        Ok(())
    } else {
        let err = ValidationError::new(duplicates);
        warn!(rules = ?err.names(), "rule tree has conflicting rule names");
        Err(err)
    }
}
