use anyhow::Result;

use crate::grid::{Cell, CellState};
use crate::sim::framework::{OperatorContext, ScienceOperator};

/// Adds one timestep of emissions and starts the step: `Cf += flux * Dt`,
/// then `Ci = Cf`.
///
/// Always the first operator of an iteration.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmissionsInjection;

impl ScienceOperator for EmissionsInjection {
    fn name(&self) -> &'static str {
        "emissions"
    }

    fn apply(&self, _cell: &Cell, state: &mut CellState, ctx: &OperatorContext) -> Result<()> {
        for (cf, flux) in state.cf.iter_mut().zip(state.emis_flux.iter()) {
            *cf += flux * ctx.dt;
        }
        state.ci = state.cf;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{CellProperties, Domain};

    #[test]
    fn test_injection_accumulates_and_copies_to_ci() {
        let mut domain =
            Domain::new(vec![Cell::new(CellProperties::with_size(10.0, 10.0, 10.0, 0))]).unwrap();
        domain.set_dt(2.0);
        let snapshot = vec![[0.0; 9]];
        let cell = &domain.cells()[0];
        let ctx = OperatorContext::new(&domain, &snapshot, 0);

        let mut state = cell.write();
        state.emis_flux[2] = 0.5;
        state.cf[2] = 1.0;
        EmissionsInjection.apply(cell, &mut state, &ctx).unwrap();
        assert_eq!(state.cf[2], 2.0);
        assert_eq!(state.ci, state.cf);
    }
}
