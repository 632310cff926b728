use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message used when no explicit denial error is configured.
pub const DEFAULT_DENIAL_MESSAGE: &str = "Not Authorised!";

/// A reason for refusing an operation.
///
/// Denials travel inside rule results (a rule may deny with a specific
/// reason) and are what the caller finally receives when an operation is
/// rejected. They are plain values: cloning is cheap and two denials are
/// equal when their messages are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct Denial {
    message: String,
}

impl Denial {
    /// Create a denial with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The human-readable reason.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Default for Denial {
    fn default() -> Self {
        Self::new(DEFAULT_DENIAL_MESSAGE)
    }
}

impl From<&str> for Denial {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for Denial {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_denial_message() {
        let denial = Denial::default();
        assert_eq!(denial.message(), "Not Authorised!");
        assert_eq!(denial.to_string(), "Not Authorised!");
    }

    #[test]
    fn denial_from_strings() {
        assert_eq!(Denial::from("nope"), Denial::new("nope"));
        assert_eq!(Denial::from(String::from("nope")).message(), "nope");
    }

    #[test]
    fn denial_serde_roundtrip() {
        let denial = Denial::new("missing scope");
        let json = serde_json::to_value(&denial).unwrap();
        assert_eq!(json, serde_json::json!({"message": "missing scope"}));
        let back: Denial = serde_json::from_value(json).unwrap();
        assert_eq!(back, denial);
    }
}
