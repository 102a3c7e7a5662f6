use anyhow::Result;

use crate::grid::{Cell, CellState, Direction};
use crate::sim::framework::{OperatorContext, ScienceOperator};

/// Staggered-grid turbulent diffusion.
///
/// Each face contributes `frac * K * (Cn - C) / (d * extent)` where `K` is the
/// interface diffusivity and `d` the center-to-center distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct TurbulentMixing;

const FACES: [Direction; 6] = [
    Direction::West,
    Direction::East,
    Direction::South,
    Direction::North,
    Direction::Below,
    Direction::Above,
];

impl ScienceOperator for TurbulentMixing {
    fn name(&self) -> &'static str {
        "mixing"
    }

    fn apply(&self, cell: &Cell, state: &mut CellState, ctx: &OperatorContext) -> Result<()> {
        let c = state.cf;
        let p = &cell.props;
        let mut tendency = [0.0; 9];
        for dir in FACES {
            let extent = match dir {
                Direction::West | Direction::East => p.dx,
                Direction::South | Direction::North => p.dy,
                _ => p.dz,
            };
            let face = cell.topology.get(dir);
            for (k, neighbor) in cell.neighbors.get(dir).iter().enumerate() {
                let d = face.half_distances[k];
                if d <= 0.0 {
                    continue;
                }
                let coeff = face.fractions[k] * face.diffusivities[k] / (d * extent);
                let cn = ctx.neighbor_concentrations(neighbor);
                for ((t, own), other) in tendency.iter_mut().zip(&c).zip(cn) {
                    *t += coeff * (other - own);
                }
            }
        }
        for (cf, t) in state.cf.iter_mut().zip(tendency) {
            *cf = (*cf + t * ctx.dt).max(0.0);
        }
        Ok(())
    }
}
