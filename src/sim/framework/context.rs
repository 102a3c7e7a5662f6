use crate::grid::{CellProperties, Domain, NeighborRef};
use crate::species::Concentrations;

/// Read-only context handed to every operator application.
///
/// Neighbor concentrations come from the snapshot of all active `Cf` vectors
/// taken at the last phase barrier, so they never reflect a half-finished
/// phase. Ghost neighbors read as their fixed (zero) concentrations.
pub struct OperatorContext<'a> {
    /// Global timestep [s].
    pub dt: f64,
    /// Index of the cell being updated.
    pub cell_index: usize,
    domain: &'a Domain,
    snapshot: &'a [Concentrations],
}

impl<'a> OperatorContext<'a> {
    pub fn new(domain: &'a Domain, snapshot: &'a [Concentrations], cell_index: usize) -> Self {
        Self {
            dt: domain.dt(),
            cell_index,
            domain,
            snapshot,
        }
    }

    pub fn domain(&self) -> &'a Domain {
        self.domain
    }

    /// `Cf` of every active cell as of the last barrier.
    pub fn snapshot(&self) -> &'a [Concentrations] {
        self.snapshot
    }

    pub fn neighbor_props(&self, neighbor: &NeighborRef) -> &'a CellProperties {
        self.domain.neighbor_props(neighbor)
    }

    pub fn neighbor_concentrations(&self, neighbor: &NeighborRef) -> &'a Concentrations {
        match *neighbor {
            NeighborRef::Cell(i) => &self.snapshot[i],
            NeighborRef::Ghost { side, index } => {
                &self.domain.boundaries().side(side)[index].concentrations
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Direction, RegularGrid};
    use crate::species::ZERO_CONCENTRATIONS;

    #[test]
    fn test_neighbors_read_snapshot_and_ghosts() {
        let domain = Domain::new(RegularGrid::new(2, 1, 10.0, 10.0, vec![5.0]).cells()).unwrap();
        let mut snapshot = vec![ZERO_CONCENTRATIONS; 2];
        snapshot[1][4] = 3.0;
        let ctx = OperatorContext::new(&domain, &snapshot, 0);

        let cell = &domain.cells()[0];
        let east = cell.neighbors.get(Direction::East)[0];
        assert_eq!(ctx.neighbor_concentrations(&east)[4], 3.0);

        let west = cell.neighbors.get(Direction::West)[0];
        assert!(west.is_ghost());
        assert_eq!(ctx.neighbor_concentrations(&west), &ZERO_CONCENTRATIONS);
        assert_eq!(ctx.neighbor_props(&west).dx, 10.0);
    }
}
