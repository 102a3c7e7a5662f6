//! Steady-state finite-volume air pollution model.
//!
//! A 3-D variable-resolution grid of control volumes is advanced with an
//! ordered sequence of per-cell science operators until per-species mass
//! stops changing, then per-cell concentrations, population and derived
//! mortality are extracted by name.

pub mod config;
pub mod error;
pub mod grid;
pub mod io;
pub mod output;
pub mod sim;
pub mod species;
pub mod vecutils;

// Prelude
pub use config::ModelConfig;
pub use error::{ModelError, Result};
pub use grid::{Cell, CellProperties, Domain, RegularGrid};
pub use output::OutputAccessor;
pub use sim::framework::{FnOperator, OperatorContext, OperatorSequence, ScienceOperator};
pub use sim::{Emissions, Model, RunOutput, RunSummary, Termination};
pub use species::{EmissionPollutant, Species};
