use anyhow::Result;

use crate::grid::{Cell, CellProperties, CellState, Direction};
use crate::sim::framework::{OperatorContext, ScienceOperator};

/// First-order upwind advection by the mean wind.
///
/// The face velocity is the mean of the two cells' wind along the face
/// normal. Inflow carries the neighbor's concentration, outflow carries this
/// cell's, each weighted by the neighbor's overlap fraction.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpwindAdvection;

/// Wind component normal to the face, the cell extent along it, and `+1` when
/// a positive wind blows into the cell through that face.
fn face_axis(dir: Direction, p: &CellProperties) -> Option<(f64, f64, f64)> {
    match dir {
        Direction::West => Some((p.u_avg, p.dx, 1.0)),
        Direction::East => Some((p.u_avg, p.dx, -1.0)),
        Direction::South => Some((p.v_avg, p.dy, 1.0)),
        Direction::North => Some((p.v_avg, p.dy, -1.0)),
        Direction::Below => Some((p.w_avg, p.dz, 1.0)),
        Direction::Above => Some((p.w_avg, p.dz, -1.0)),
        Direction::GroundLevel => None,
    }
}

impl ScienceOperator for UpwindAdvection {
    fn name(&self) -> &'static str {
        "advection"
    }

    fn apply(&self, cell: &Cell, state: &mut CellState, ctx: &OperatorContext) -> Result<()> {
        let c = state.cf;
        let mut tendency = [0.0; 9];
        for dir in Direction::ALL {
            let Some((own_wind, extent, sign)) = face_axis(dir, &cell.props) else {
                continue;
            };
            let fractions = &cell.topology.get(dir).fractions;
            for (neighbor, frac) in cell.neighbors.get(dir).iter().zip(fractions) {
                let Some((nb_wind, _, _)) = face_axis(dir, ctx.neighbor_props(neighbor)) else {
                    continue;
                };
                let inward = sign * 0.5 * (own_wind + nb_wind);
                let upwind = if inward > 0.0 {
                    ctx.neighbor_concentrations(neighbor)
                } else {
                    &c
                };
                for (t, cu) in tendency.iter_mut().zip(upwind) {
                    *t += inward * frac * cu / extent;
                }
            }
        }
        for (cf, t) in state.cf.iter_mut().zip(tendency) {
            *cf = (*cf + t * ctx.dt).max(0.0);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{BoundaryMode, Domain, RegularGrid};
    use crate::sim::operators::tests::apply_sequentially;

    fn windy_pair(mode: BoundaryMode) -> Domain {
        let mut template = CellProperties::default();
        template.u_avg = 1.0;
        let cells = RegularGrid::new(2, 1, 10.0, 10.0, vec![10.0])
            .with_template(template)
            .cells();
        let mut domain = Domain::with_boundary_mode(cells, mode).unwrap();
        domain.set_dt(1.0);
        domain
    }

    #[test]
    fn test_mass_moves_downwind() {
        let domain = windy_pair(BoundaryMode::Synthesize);
        domain.cells()[0].write().cf[2] = 1.0;
        apply_sequentially(&domain, &UpwindAdvection);

        let a = domain.cells()[0].read().cf[2];
        let b = domain.cells()[1].read().cf[2];
        assert!((a - 0.9).abs() < 1e-12);
        assert!((b - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_open_boundaries_conserve_mass() {
        let domain = windy_pair(BoundaryMode::Open);
        domain.cells()[0].write().cf[0] = 3.0;
        domain.cells()[1].write().cf[0] = 1.0;
        apply_sequentially(&domain, &UpwindAdvection);
        let total = domain.species_mass()[0];
        assert!((total - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_still_air_changes_nothing() {
        let mut domain =
            Domain::new(RegularGrid::new(3, 3, 10.0, 10.0, vec![5.0, 5.0]).cells()).unwrap();
        domain.set_dt(60.0);
        for cell in domain.cells() {
            cell.write().cf = [2.0; 9];
        }
        apply_sequentially(&domain, &UpwindAdvection);
        assert!(domain.cells().iter().all(|c| c.read().cf == [2.0; 9]));
    }
}
