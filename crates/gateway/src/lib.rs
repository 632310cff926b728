pub mod builder;
pub mod config;
pub mod error;
pub mod metrics;
pub mod options;
pub mod shield;

pub use bulwark_core::{Denial, Operation, OperationType};
pub use bulwark_rules::{RuleResult, RuleTree, ShieldRule};
pub use builder::ShieldBuilder;
pub use config::{FallbackPolicy, ShieldConfig};
pub use error::ShieldError;
pub use metrics::{MetricsSnapshot, ShieldMetrics};
pub use options::{ErrorMapper, FallbackError, ShieldOptions};
pub use shield::Shield;
