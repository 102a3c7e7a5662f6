//! Reference science operators.
//!
//! Each operator updates only its own cell's `Cf`, reading neighbors through
//! the [`OperatorContext`](super::framework::OperatorContext) snapshot.
//! Concentrations are clamped at zero after every update. No chemical
//! mechanism is provided here; callers plug one in as another operator.

pub mod advection;
pub mod deposition;
pub mod injection;
pub mod mixing;

pub use advection::UpwindAdvection;
pub use deposition::{DryDeposition, WetDeposition};
pub use injection::EmissionsInjection;
pub use mixing::TurbulentMixing;

use super::framework::OperatorSequence;

/// Transport and removal without chemistry: advection, mixing, dry and wet
/// deposition. Emissions injection is added by the run driver.
pub fn transport_sequence() -> OperatorSequence {
    OperatorSequence::new()
        .with_operator(UpwindAdvection)
        .with_operator(TurbulentMixing)
        .with_operator(DryDeposition)
        .with_operator(WetDeposition)
}
