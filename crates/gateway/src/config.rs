use std::time::Duration;

use bulwark_core::DEFAULT_DENIAL_MESSAGE;
use bulwark_rules::{ShieldRule, allow, deny};
use serde::Deserialize;

use crate::error::ShieldError;
use crate::options::{FallbackError, ShieldOptions};

/// Rule applied to operations the tree does not mention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Authorize unlisted operations.
    #[default]
    Allow,
    /// Deny unlisted operations.
    Deny,
}

impl FallbackPolicy {
    /// The rule implementing this policy.
    pub fn to_rule<C>(self) -> ShieldRule<C> {
        match self {
            Self::Allow => allow(),
            Self::Deny => deny(),
        }
    }
}

/// Declarative shield settings.
///
/// Rules themselves are code; only the switches around them are configurable.
/// [`from_toml`](Self::from_toml) reads the keys at the top level of the
/// document. To nest them under a table of a larger config, embed
/// `ShieldConfig` as a field of that config's struct.
///
/// # Example
///
/// ```toml
/// debug = false
/// allow_external_errors = true
/// fallback_rule = "deny"
/// fallback_error = "Forbidden"
/// predicate_timeout_ms = 250
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ShieldConfig {
    /// Propagate rule failures instead of denying.
    #[serde(default)]
    pub debug: bool,
    /// Surface denials carried by rules to the caller.
    #[serde(default)]
    pub allow_external_errors: bool,
    /// Policy for operations with no tree entry.
    #[serde(default)]
    pub fallback_rule: FallbackPolicy,
    /// Message returned for refused operations.
    #[serde(default = "default_fallback_error")]
    pub fallback_error: String,
    /// Per-predicate deadline in milliseconds.
    #[serde(default)]
    pub predicate_timeout_ms: Option<u64>,
}

impl Default for ShieldConfig {
    fn default() -> Self {
        Self {
            debug: false,
            allow_external_errors: false,
            fallback_rule: FallbackPolicy::default(),
            fallback_error: default_fallback_error(),
            predicate_timeout_ms: None,
        }
    }
}

fn default_fallback_error() -> String {
    DEFAULT_DENIAL_MESSAGE.to_owned()
}

impl ShieldConfig {
    /// Parse a config from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ShieldError> {
        toml::from_str(text).map_err(|e| ShieldError::Configuration(e.to_string()))
    }

    /// Convert into runtime options for contexts of type `C`.
    pub fn into_options<C>(self) -> ShieldOptions<C> {
        ShieldOptions {
            debug: self.debug,
            allow_external_errors: self.allow_external_errors,
            fallback_rule: self.fallback_rule.to_rule(),
            fallback_error: FallbackError::from(self.fallback_error),
            predicate_timeout: self.predicate_timeout_ms.map(Duration::from_millis),
        }
    }
}
