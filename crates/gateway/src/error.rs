use bulwark_core::Denial;
use thiserror::Error;

/// Errors returned by the shield.
#[derive(Debug, Error)]
pub enum ShieldError {
    /// The rule tree reuses a rule name for different rules.
    #[error("invalid rule tree: {0}")]
    Validation(#[from] bulwark_rules::ValidationError),

    /// The operation was refused.
    #[error(transparent)]
    Denied(Denial),

    /// A rule failed while debug mode was enabled.
    #[error("rule error: {0}")]
    Rule(#[from] bulwark_rules::RuleError),

    /// The shield was misconfigured.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ShieldError {
    /// The denial, if the operation was refused.
    pub fn denial(&self) -> Option<&Denial> {
        match self {
            Self::Denied(denial) => Some(denial),
            Self::Validation(_) | Self::Rule(_) | Self::Configuration(_) => None,
        }
    }

    /// Whether this error is a refusal rather than a failure.
    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Denied(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denied_displays_denial_message() {
        let err = ShieldError::Denied(Denial::new("Not Authorised!"));
        assert_eq!(err.to_string(), "Not Authorised!");
        assert!(err.is_denied());
        assert_eq!(err.denial().map(Denial::message), Some("Not Authorised!"));
    }

    #[test]
    fn configuration_message() {
        let err = ShieldError::Configuration("rule tree is required".into());
        assert_eq!(err.to_string(), "configuration error: rule tree is required");
        assert!(!err.is_denied());
        assert!(err.denial().is_none());
    }
}
