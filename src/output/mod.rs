//! Output extraction.
//!
//! # Architecture
//!
//! ```text
//! VariableRegistry (built once)          OutputAccessor
//!   emissions ─┐                           name ──► registry lookup
//!   concentrations                                   │
//!   population                             cells of layer k (early exit)
//!   "<pop> deaths" ◄── ConcentrationResponse         │
//!   physical fields ─┘                      read lock per cell ──► f64
//! ```
//!
//! Lookups follow namespace precedence: the first namespace to register a
//! name owns it.

pub mod accessor;
pub mod health;
pub mod registry;

pub use accessor::OutputAccessor;
pub use health::{ConcentrationResponse, LogLinearResponse};
pub use registry::{Namespace, Variable, VariableRegistry};
