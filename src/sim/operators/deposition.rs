use anyhow::Result;

use crate::grid::{Cell, CellProperties, CellState};
use crate::sim::framework::{OperatorContext, ScienceOperator};
use crate::species::Species;

/// Dry deposition velocity of `species` [m/s].
pub fn dry_deposition_velocity(p: &CellProperties, species: Species) -> f64 {
    match species {
        s if s.is_particle() => p.particle_dry_dep,
        Species::GasSulfur => p.so2_dry_dep,
        Species::GasAmmonia => p.nh3_dry_dep,
        Species::GasOrganic => p.voc_dry_dep,
        _ => p.nox_dry_dep,
    }
}

/// Wet scavenging rate of `species` [1/s].
pub fn wet_deposition_rate(p: &CellProperties, species: Species) -> f64 {
    match species {
        s if s.is_particle() => p.particle_wet_dep,
        Species::GasSulfur => p.so2_wet_dep,
        _ => p.other_gas_wet_dep,
    }
}

fn remove(state: &mut CellState, dt: f64, rate: impl Fn(Species) -> f64) {
    for species in Species::ALL {
        let factor = (1.0 - rate(species) * dt).max(0.0);
        state.cf[species.index()] *= factor;
    }
}

/// Surface removal in the ground layer at `vd / Δz`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryDeposition;

impl ScienceOperator for DryDeposition {
    fn name(&self) -> &'static str {
        "dry deposition"
    }

    fn apply(&self, cell: &Cell, state: &mut CellState, ctx: &OperatorContext) -> Result<()> {
        if cell.layer() != 0 {
            return Ok(());
        }
        let p = &cell.props;
        remove(state, ctx.dt, |s| dry_deposition_velocity(p, s) / p.dz);
        Ok(())
    }
}

/// First-order scavenging by precipitation in every layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct WetDeposition;

impl ScienceOperator for WetDeposition {
    fn name(&self) -> &'static str {
        "wet deposition"
    }

    fn apply(&self, cell: &Cell, state: &mut CellState, ctx: &OperatorContext) -> Result<()> {
        remove(state, ctx.dt, |s| wet_deposition_rate(&cell.props, s));
        Ok(())
    }
}
