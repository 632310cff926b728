use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Separator between the segments of an operation path (`user.create`).
pub const PATH_SEPARATOR: char = '.';

/// The category an operation belongs to.
///
/// These are the only keys recognised at the top level of a flat rule tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    /// A read-only request.
    Query,
    /// A state-changing request.
    Mutation,
    /// A long-lived stream of results.
    Subscription,
}

impl OperationType {
    /// Every recognised operation category.
    pub const ALL: [Self; 3] = [Self::Query, Self::Mutation, Self::Subscription];

    /// Return the `snake_case` name (matches serde serialization).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
            Self::Subscription => "subscription",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Returned when a string does not name an [`OperationType`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown operation type: {0}")]
pub struct UnknownOperationType(pub String);

impl FromStr for OperationType {
    type Err = UnknownOperationType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "query" => Ok(Self::Query),
            "mutation" => Ok(Self::Mutation),
            "subscription" => Ok(Self::Subscription),
            other => Err(UnknownOperationType(other.to_owned())),
        }
    }
}

/// Describes one incoming call that must be authorised.
///
/// All fields are reference counted so that the descriptor can be handed to
/// every predicate in a rule tree without copying the context or input.
#[derive(Debug)]
pub struct Operation<C> {
    /// Caller-defined request context (user, session, tenant...).
    pub ctx: Arc<C>,
    /// Category of the operation.
    pub operation_type: OperationType,
    /// Dotted path of the operation, e.g. `user.create`.
    pub path: Arc<str>,
    /// Structured (validated) input.
    pub input: Arc<serde_json::Value>,
    /// Input exactly as received, before validation.
    pub raw_input: Arc<serde_json::Value>,
}

// Manual impl: cloning must not require `C: Clone`.
impl<C> Clone for Operation<C> {
    fn clone(&self) -> Self {
        Self {
            ctx: Arc::clone(&self.ctx),
            operation_type: self.operation_type,
            path: Arc::clone(&self.path),
            input: Arc::clone(&self.input),
            raw_input: Arc::clone(&self.raw_input),
        }
    }
}

impl<C> Operation<C> {
    /// Create a descriptor with `null` input and raw input.
    pub fn new(ctx: Arc<C>, operation_type: OperationType, path: impl Into<Arc<str>>) -> Self {
        Self {
            ctx,
            operation_type,
            path: path.into(),
            input: Arc::new(serde_json::Value::Null),
            raw_input: Arc::new(serde_json::Value::Null),
        }
    }

    /// Set the structured input.
    #[must_use]
    pub fn with_input(mut self, input: serde_json::Value) -> Self {
        self.input = Arc::new(input);
        self
    }

    /// Set the raw input.
    #[must_use]
    pub fn with_raw_input(mut self, raw_input: serde_json::Value) -> Self {
        self.raw_input = Arc::new(raw_input);
        self
    }

    /// The trailing path segment, i.e. the operation name.
    pub fn name(&self) -> &str {
        self.path
            .rsplit(PATH_SEPARATOR)
            .next()
            .unwrap_or(&self.path)
    }

    /// The leading path segment, used as the namespace key.
    pub fn namespace(&self) -> &str {
        self.path
            .split(PATH_SEPARATOR)
            .next()
            .unwrap_or(&self.path)
    }
}
