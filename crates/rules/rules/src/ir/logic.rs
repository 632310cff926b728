use std::fmt;
use std::sync::Arc;

use bulwark_core::Denial;
use serde::{Deserialize, Serialize};

use super::rule::Rule;

/// The combinator a [`LogicRule`] applies to its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicKind {
    /// Every child must authorize. All children run.
    And,
    /// At least one child must authorize. All children run.
    Or,
    /// Negates its single child.
    Not,
    /// Like `And`, but sequential and stops at the first refusal.
    Chain,
    /// Like `Or`, but sequential and stops at the first authorization.
    Race,
    /// Always authorizes.
    True,
    /// Always denies.
    False,
}

impl LogicKind {
    /// Return the `snake_case` string representation (matches serde serialization).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
            Self::Chain => "chain",
            Self::Race => "race",
            Self::True => "true",
            Self::False => "false",
        }
    }
}

impl fmt::Display for LogicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A composite rule combining child rules.
///
/// Children are fixed at construction, so a logic rule can never contain
/// itself and the rule graph stays acyclic.
pub struct LogicRule<C> {
    kind: LogicKind,
    children: Vec<ShieldRule<C>>,
    error: Option<Denial>,
}

impl<C> LogicRule<C> {
    pub(crate) fn new(kind: LogicKind, children: Vec<ShieldRule<C>>, error: Option<Denial>) -> Self {
        Self {
            kind,
            children,
            error,
        }
    }

    /// The combinator.
    pub fn kind(&self) -> LogicKind {
        self.kind
    }

    /// Child rules in evaluation order.
    pub fn children(&self) -> &[ShieldRule<C>] {
        &self.children
    }

    /// The override error reported by a `Not` whose child authorized.
    pub fn error(&self) -> Option<&Denial> {
        self.error.as_ref()
    }
}

impl<C> fmt::Debug for LogicRule<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogicRule")
            .field("kind", &self.kind)
            .field("children", &self.children)
            .field("error", &self.error)
            .finish()
    }
}

/// Any node of a rule tree: a leaf [`Rule`] or a shared [`LogicRule`].
pub enum ShieldRule<C> {
    /// A leaf rule.
    Rule(Rule<C>),
    /// A combinator. Shared, so the same sub-policy may be used in many places.
    Logic(Arc<LogicRule<C>>),
}

impl<C> ShieldRule<C> {
    /// The leaf rule, if this node is one.
    pub fn as_rule(&self) -> Option<&Rule<C>> {
        match self {
            Self::Rule(rule) => Some(rule),
            Self::Logic(_) => None,
        }
    }

    /// The logic rule, if this node is one.
    pub fn as_logic(&self) -> Option<&LogicRule<C>> {
        match self {
            Self::Rule(_) => None,
            Self::Logic(logic) => Some(logic.as_ref()),
        }
    }
}

impl<C> Clone for ShieldRule<C> {
    fn clone(&self) -> Self {
        match self {
            Self::Rule(rule) => Self::Rule(rule.clone()),
            Self::Logic(logic) => Self::Logic(Arc::clone(logic)),
        }
    }
}

impl<C> fmt::Debug for ShieldRule<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rule(rule) => rule.fmt(f),
            Self::Logic(logic) => logic.fmt(f),
        }
    }
}

impl<C> From<Rule<C>> for ShieldRule<C> {
    fn from(rule: Rule<C>) -> Self {
        Self::Rule(rule)
    }
}

impl<C> From<LogicRule<C>> for ShieldRule<C> {
    fn from(logic: LogicRule<C>) -> Self {
        Self::Logic(Arc::new(logic))
    }
}
