use tracing::debug;

use super::boundary::{self, Boundaries};
use super::cell::{Cell, CellGeometry, CellProperties, Direction, NeighborRef};
use super::topology;
use crate::error::{ModelError, Result};
use crate::species::{Concentrations, ZERO_CONCENTRATIONS};

/// Whether open faces receive ghost cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryMode {
    /// Every open West/East/South/North/Top face gets a ghost.
    Synthesize,
    /// Leave open faces empty: a true edge with no boundary flux.
    Open,
}

/// The simulated grid: active cells sorted by layer, ghost collections and
/// the global timestep.
#[derive(Debug)]
pub struct Domain {
    cells: Vec<Cell>,
    boundaries: Boundaries,
    n_layers: usize,
    dt: f64,
}

impl Domain {
    /// Builds a domain with ghost cells on every open face.
    pub fn new(cells: Vec<Cell>) -> Result<Self> {
        Self::with_boundary_mode(cells, BoundaryMode::Synthesize)
    }

    /// Validates, sorts by ascending layer, synthesizes ghosts (per `mode`)
    /// and computes the staggered-grid topology.
    ///
    /// Neighbor indices in `cells` refer to the input order; they are
    /// remapped if sorting moves cells.
    pub fn with_boundary_mode(cells: Vec<Cell>, mode: BoundaryMode) -> Result<Self> {
        validate(&cells)?;
        let mut cells = sort_by_layer(cells);

        let boundaries = match mode {
            BoundaryMode::Synthesize => boundary::synthesize(&mut cells),
            BoundaryMode::Open => Boundaries::default(),
        };
        topology::build(&mut cells, &boundaries);

        let n_layers = cells.iter().map(|c| c.layer() + 1).max().unwrap_or(0);
        debug!(
            cells = cells.len(),
            ghosts = boundaries.len(),
            n_layers,
            "domain built"
        );

        Ok(Self {
            cells,
            boundaries,
            n_layers,
            dt: 0.0,
        })
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn boundaries(&self) -> &Boundaries {
        &self.boundaries
    }

    pub fn n_layers(&self) -> usize {
        self.n_layers
    }

    /// Global timestep in seconds. Zero until a timestep has been set.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub(crate) fn set_dt(&mut self, dt: f64) {
        self.dt = dt;
    }

    /// Physical properties of an active or ghost neighbor.
    pub fn neighbor_props(&self, neighbor: &NeighborRef) -> &CellProperties {
        boundary::resolve(&self.cells, &self.boundaries, neighbor)
    }

    /// Zeroes `Ci`, `Cf` and the emissions flux of every cell.
    pub(crate) fn reset_state(&mut self) {
        for cell in self.cells.iter_mut() {
            *cell.state_mut() = Default::default();
        }
    }

    /// Sum of `Cf` over all active cells, per species.
    pub fn species_mass(&self) -> Concentrations {
        let mut sums = ZERO_CONCENTRATIONS;
        for cell in &self.cells {
            let state = cell.read();
            for (sum, c) in sums.iter_mut().zip(state.cf.iter()) {
                *sum += c;
            }
        }
        sums
    }

    /// Footprint polygons of every cell in `layer`, in cell order.
    pub fn geometry(&self, layer: usize) -> Vec<CellGeometry> {
        let mut out = Vec::new();
        for cell in &self.cells {
            if cell.layer() > layer {
                break;
            }
            if cell.layer() == layer {
                out.push(cell.geometry.clone());
            }
        }
        out
    }
}

fn validate(cells: &[Cell]) -> Result<()> {
    let n = cells.len();
    for (i, cell) in cells.iter().enumerate() {
        let p = &cell.props;
        for (name, v) in [("dx", p.dx), ("dy", p.dy), ("dz", p.dz)] {
            if !(v.is_finite() && v > 0.0) {
                return Err(ModelError::InvalidGrid(format!(
                    "cell {i} has non-positive extent {name}={v}"
                )));
            }
        }
        for (dir, link) in cell.neighbors.iter() {
            match *link {
                NeighborRef::Cell(j) if j >= n => {
                    return Err(ModelError::InvalidGrid(format!(
                        "cell {i} has {dir:?} neighbor {j} outside the grid ({n} cells)"
                    )));
                }
                NeighborRef::Cell(j) if j == i => {
                    return Err(ModelError::InvalidGrid(format!(
                        "cell {i} lists itself as its {dir:?} neighbor"
                    )));
                }
                NeighborRef::Ghost { .. } => {
                    return Err(ModelError::InvalidGrid(format!(
                        "cell {i} references a ghost before boundary synthesis"
                    )));
                }
                NeighborRef::Cell(_) => {}
            }
        }
    }
    Ok(())
}

/// Stable sort by layer with neighbor index remapping.
fn sort_by_layer(cells: Vec<Cell>) -> Vec<Cell> {
    if cells.windows(2).all(|w| w[0].layer() <= w[1].layer()) {
        return cells;
    }

    let mut indexed: Vec<(usize, Cell)> = cells.into_iter().enumerate().collect();
    indexed.sort_by_key(|(_, c)| c.layer());

    let mut new_position = vec![0; indexed.len()];
    for (new, (old, _)) in indexed.iter().enumerate() {
        new_position[*old] = new;
    }

    indexed
        .into_iter()
        .map(|(_, mut cell)| {
            for dir in Direction::ALL {
                for link in cell.neighbors.get_mut(dir).iter_mut() {
                    if let NeighborRef::Cell(j) = link {
                        *j = new_position[*j];
                    }
                }
            }
            cell
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(layer: usize) -> Cell {
        Cell::new(CellProperties::with_size(10.0, 10.0, 10.0, layer))
    }

    #[test]
    fn test_sorting_remaps_neighbors() {
        // Input: [upper, ground]; upper sits above ground.
        let mut cells = vec![cell(1), cell(0)];
        cells[0].neighbors.push(Direction::Below, NeighborRef::Cell(1));
        cells[1].neighbors.push(Direction::Above, NeighborRef::Cell(0));

        let d = Domain::new(cells).unwrap();
        assert_eq!(d.cells()[0].layer(), 0);
        assert_eq!(d.cells()[1].layer(), 1);
        assert_eq!(d.cells()[0].neighbors.get(Direction::Above), &[NeighborRef::Cell(1)]);
        assert_eq!(d.cells()[1].neighbors.get(Direction::Below), &[NeighborRef::Cell(0)]);
        assert_eq!(d.n_layers(), 2);
    }

    #[test]
    fn test_zero_extent_is_rejected() {
        let cells = vec![Cell::new(CellProperties::with_size(10.0, 0.0, 10.0, 0))];
        let err = Domain::new(cells).unwrap_err();
        assert!(matches!(err, ModelError::InvalidGrid(_)));
    }

    #[test]
    fn test_dangling_neighbor_is_rejected() {
        let mut cells = vec![cell(0)];
        cells[0].neighbors.push(Direction::East, NeighborRef::Cell(3));
        assert!(matches!(
            Domain::new(cells).unwrap_err(),
            ModelError::InvalidGrid(_)
        ));
    }

    #[test]
    fn test_open_mode_skips_ghosts() {
        let d = Domain::with_boundary_mode(vec![cell(0)], BoundaryMode::Open).unwrap();
        assert!(d.boundaries().is_empty());
        assert!(d.cells()[0].neighbors.get(Direction::West).is_empty());
    }

    #[test]
    fn test_species_mass_sums_cf() {
        let d = Domain::new(vec![cell(0), cell(0)]).unwrap();
        d.cells()[0].write().cf[2] = 1.5;
        d.cells()[1].write().cf[2] = 2.5;
        let m = d.species_mass();
        assert_eq!(m[2], 4.0);
        assert_eq!(m[0], 0.0);
    }

    #[test]
    fn test_geometry_stops_after_layer() {
        let mut cells = vec![cell(0), cell(0), cell(1)];
        cells[2].geometry = CellGeometry(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]);
        let d = Domain::new(cells).unwrap();
        assert_eq!(d.geometry(0).len(), 2);
        assert_eq!(d.geometry(1).len(), 1);
        assert_eq!(d.geometry(1)[0].0.len(), 3);
        assert!(d.geometry(5).is_empty());
    }
}
