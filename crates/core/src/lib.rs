pub mod denial;
pub mod operation;

pub use denial::{DEFAULT_DENIAL_MESSAGE, Denial};
pub use operation::{Operation, OperationType, PATH_SEPARATOR, UnknownOperationType};
