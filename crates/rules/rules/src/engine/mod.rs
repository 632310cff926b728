pub mod options;
pub mod resolve;
pub mod result;

pub use options::EvalOptions;
pub use result::{IntoRuleResult, RuleResult};
