pub mod constructors;
pub mod logic;
pub mod rule;
pub mod tree;
