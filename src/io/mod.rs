//! File I/O: scenario input and results output, both JSON.

pub mod results;
pub mod scenario;

pub use results::{to_results_string, write_results};
pub use scenario::{OperatorKind, Scenario};
