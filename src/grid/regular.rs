use serde::{Deserialize, Serialize};

use super::cell::{Cell, CellGeometry, CellProperties, Direction, NeighborRef, Population};

/// Uniform structured grid: `nx * ny` columns with per-layer thickness.
///
/// Cells are emitted layer by layer (ground first), rows south to north,
/// columns west to east, so the result is already sorted by layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegularGrid {
    pub nx: usize,
    pub ny: usize,
    /// Column width [m].
    pub dx: f64,
    /// Row height [m].
    pub dy: f64,
    /// Thickness of each layer, ground first [m].
    pub layer_thicknesses: Vec<f64>,
    /// Physical properties copied into every cell (size and layer are
    /// overwritten per cell).
    pub template: CellProperties,
    /// Population attached to every ground-level cell.
    pub population: Population,
}

impl RegularGrid {
    pub fn new(nx: usize, ny: usize, dx: f64, dy: f64, layer_thicknesses: Vec<f64>) -> Self {
        Self {
            nx,
            ny,
            dx,
            dy,
            layer_thicknesses,
            template: CellProperties::default(),
            population: Population::default(),
        }
    }

    pub fn with_template(mut self, template: CellProperties) -> Self {
        self.template = template;
        self
    }

    pub fn with_population(mut self, population: Population) -> Self {
        self.population = population;
        self
    }

    pub fn n_layers(&self) -> usize {
        self.layer_thicknesses.len()
    }

    pub fn len(&self) -> usize {
        self.nx * self.ny * self.n_layers()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Position of column `(i, j)` in layer `k`.
    pub fn index(&self, i: usize, j: usize, k: usize) -> usize {
        (k * self.ny + j) * self.nx + i
    }

    /// Builds fully linked cells. Edge faces are left empty for boundary
    /// synthesis.
    pub fn cells(&self) -> Vec<Cell> {
        let mut cells = Vec::with_capacity(self.len());
        let mut height = 0.0;
        for (k, &dz) in self.layer_thicknesses.iter().enumerate() {
            height += dz;
            for j in 0..self.ny {
                for i in 0..self.nx {
                    let mut props = self.template.clone();
                    props.dx = self.dx;
                    props.dy = self.dy;
                    props.dz = dz;
                    props.layer = k;
                    props.layer_height = height;

                    let mut cell = Cell::new(props).with_geometry(self.footprint(i, j));
                    if k == 0 {
                        cell = cell.with_population(self.population.clone());
                    }
                    self.link(&mut cell, i, j, k);
                    cells.push(cell);
                }
            }
        }
        cells
    }

    fn link(&self, cell: &mut Cell, i: usize, j: usize, k: usize) {
        let n = &mut cell.neighbors;
        if i > 0 {
            n.push(Direction::West, NeighborRef::Cell(self.index(i - 1, j, k)));
        }
        if i + 1 < self.nx {
            n.push(Direction::East, NeighborRef::Cell(self.index(i + 1, j, k)));
        }
        if j > 0 {
            n.push(Direction::South, NeighborRef::Cell(self.index(i, j - 1, k)));
        }
        if j + 1 < self.ny {
            n.push(Direction::North, NeighborRef::Cell(self.index(i, j + 1, k)));
        }
        if k > 0 {
            n.push(Direction::Below, NeighborRef::Cell(self.index(i, j, k - 1)));
            n.push(Direction::GroundLevel, NeighborRef::Cell(self.index(i, j, 0)));
        }
        if k + 1 < self.n_layers() {
            n.push(Direction::Above, NeighborRef::Cell(self.index(i, j, k + 1)));
        }
    }

    fn footprint(&self, i: usize, j: usize) -> CellGeometry {
        let x0 = i as f64 * self.dx;
        let y0 = j as f64 * self.dy;
        let x1 = x0 + self.dx;
        let y1 = y0 + self.dy;
        CellGeometry(vec![[x0, y0], [x1, y0], [x1, y1], [x0, y1], [x0, y0]])
    }
}

impl Default for RegularGrid {
    fn default() -> Self {
        Self::new(1, 1, 1000.0, 1000.0, vec![50.0])
    }
}
