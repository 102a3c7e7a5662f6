//! Science operator contract.
//!
//! Operators are the pluggable per-cell physics (emissions, advection, mixing,
//! deposition, chemistry). The scheduler applies an [`OperatorSequence`] to
//! every active cell, one operator at a time across the whole grid.

pub mod context;
pub mod operator;
pub mod sequence;

pub use context::OperatorContext;
pub use operator::{FnOperator, ScienceOperator};
pub use sequence::OperatorSequence;
