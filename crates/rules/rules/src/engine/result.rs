use bulwark_core::Denial;
use serde::{Deserialize, Serialize};

use crate::error::PredicateError;

/// Outcome of resolving a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleResult {
    /// The operation may proceed.
    Authorized,
    /// The operation is refused without a specific reason.
    Denied,
    /// The operation is refused with a caller-supplied reason.
    DeniedWithError(Denial),
}

impl RuleResult {
    /// `true` only for [`RuleResult::Authorized`].
    pub fn is_authorized(&self) -> bool {
        matches!(self, Self::Authorized)
    }

    /// The reason carried by a [`RuleResult::DeniedWithError`].
    pub fn denial(&self) -> Option<&Denial> {
        match self {
            Self::DeniedWithError(denial) => Some(denial),
            Self::Authorized | Self::Denied => None,
        }
    }

    /// Consume the result, keeping only its reason.
    pub fn into_denial(self) -> Option<Denial> {
        match self {
            Self::DeniedWithError(denial) => Some(denial),
            Self::Authorized | Self::Denied => None,
        }
    }

    /// Return the `snake_case` string representation (matches serde serialization).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authorized => "authorized",
            Self::Denied => "denied",
            Self::DeniedWithError(_) => "denied_with_error",
        }
    }

    /// Reduce a set of sibling results that did not all authorize.
    ///
    /// The first reason in order wins over a plain denial.
    pub(crate) fn first_failure(results: impl IntoIterator<Item = Self>) -> Self {
        results
            .into_iter()
            .find(|result| matches!(result, Self::DeniedWithError(_)))
            .unwrap_or(Self::Denied)
    }
}

/// Conversion from whatever a predicate produces into a [`RuleResult`].
///
/// `true` authorizes, a [`Denial`] or a string denies with that reason, and
/// everything else denies. An `Err` marks the predicate itself as failed.
pub trait IntoRuleResult {
    /// Normalize the value.
    fn into_rule_result(self) -> Result<RuleResult, PredicateError>;
}

impl IntoRuleResult for RuleResult {
    fn into_rule_result(self) -> Result<RuleResult, PredicateError> {
        Ok(self)
    }
}

impl IntoRuleResult for bool {
    fn into_rule_result(self) -> Result<RuleResult, PredicateError> {
        Ok(if self {
            RuleResult::Authorized
        } else {
            RuleResult::Denied
        })
    }
}

impl IntoRuleResult for Denial {
    fn into_rule_result(self) -> Result<RuleResult, PredicateError> {
        Ok(RuleResult::DeniedWithError(self))
    }
}

impl IntoRuleResult for String {
    fn into_rule_result(self) -> Result<RuleResult, PredicateError> {
        Ok(RuleResult::DeniedWithError(Denial::new(self)))
    }
}

impl IntoRuleResult for &'static str {
    fn into_rule_result(self) -> Result<RuleResult, PredicateError> {
        Ok(RuleResult::DeniedWithError(Denial::new(self)))
    }
}

impl<T: IntoRuleResult> IntoRuleResult for Option<T> {
    fn into_rule_result(self) -> Result<RuleResult, PredicateError> {
        self.map_or(Ok(RuleResult::Denied), IntoRuleResult::into_rule_result)
    }
}

impl<T, E> IntoRuleResult for Result<T, E>
where
    T: IntoRuleResult,
    E: Into<PredicateError>,
{
    fn into_rule_result(self) -> Result<RuleResult, PredicateError> {
        match self {
            Ok(value) => value.into_rule_result(),
            Err(err) => Err(err.into()),
        }
    }
}
