pub mod engine;
pub mod error;
pub mod ir;
pub mod validate;

pub use bulwark_core::{Denial, Operation, OperationType};
pub use engine::{EvalOptions, IntoRuleResult, RuleResult};
pub use error::{PredicateError, RuleError, ValidationError};
pub use ir::constructors::{allow, and, anonymous_rule, chain, deny, not, not_with, or, race, rule};
pub use ir::logic::{LogicKind, LogicRule, ShieldRule};
pub use ir::rule::{FnPredicate, Predicate, Rule, RuleId};
pub use ir::tree::RuleTree;
pub use validate::{flatten_rules, validate_rule_tree};
