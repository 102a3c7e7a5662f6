use std::collections::BTreeMap;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde::{Deserialize, Serialize};

use crate::species::{Concentrations, ZERO_CONCENTRATIONS};

/// Neighbor directions of a control volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    West,
    East,
    South,
    North,
    Below,
    Above,
    /// The ground-level cell(s) underneath an upper-layer cell.
    GroundLevel,
}

impl Direction {
    pub const ALL: [Direction; 7] = [
        Direction::West,
        Direction::East,
        Direction::South,
        Direction::North,
        Direction::Below,
        Direction::Above,
        Direction::GroundLevel,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Boundary side a ghost is synthesized on when this face is empty.
    /// The bottom of the domain has no ghost.
    pub fn boundary_side(self) -> Option<BoundarySide> {
        match self {
            Direction::West => Some(BoundarySide::West),
            Direction::East => Some(BoundarySide::East),
            Direction::South => Some(BoundarySide::South),
            Direction::North => Some(BoundarySide::North),
            Direction::Above => Some(BoundarySide::Top),
            Direction::Below | Direction::GroundLevel => None,
        }
    }
}

/// The five domain edges that receive ghost cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundarySide {
    West,
    East,
    South,
    North,
    Top,
}

impl BoundarySide {
    pub const ALL: [BoundarySide; 5] = [
        BoundarySide::West,
        BoundarySide::East,
        BoundarySide::South,
        BoundarySide::North,
        BoundarySide::Top,
    ];

    pub fn direction(self) -> Direction {
        match self {
            BoundarySide::West => Direction::West,
            BoundarySide::East => Direction::East,
            BoundarySide::South => Direction::South,
            BoundarySide::North => Direction::North,
            BoundarySide::Top => Direction::Above,
        }
    }
}

/// Index-based reference to a neighbor.
///
/// Active cells are addressed by their position in the domain's cell array,
/// ghosts by side and position in the matching boundary collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NeighborRef {
    Cell(usize),
    Ghost { side: BoundarySide, index: usize },
}

impl NeighborRef {
    pub fn is_ghost(&self) -> bool {
        matches!(self, NeighborRef::Ghost { .. })
    }
}

/// Physical scalars of a control volume. Read-only during a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CellProperties {
    /// Mean East-West wind speed [m/s].
    pub u_avg: f64,
    /// Mean North-South wind speed [m/s].
    pub v_avg: f64,
    /// Mean vertical wind speed [m/s].
    pub w_avg: f64,
    /// Turbulent deviation from the East-West velocity [m/s].
    pub u_deviation: f64,
    /// Turbulent deviation from the North-South velocity [m/s].
    pub v_deviation: f64,
    /// Turbulent deviation from the vertical velocity [m/s].
    pub w_deviation: f64,
    /// Cell-center vertical diffusivity [m²/s].
    pub kzz: f64,
    /// Cell-center horizontal diffusivity [m²/s].
    pub kxxyy: f64,
    /// ACM2 upward mixing rate [1/s].
    pub m2u: f64,
    /// ACM2 downward mixing rate [1/s].
    pub m2d: f64,
    pub dx: f64,
    pub dy: f64,
    pub dz: f64,
    pub layer: usize,
    /// Height of the top edge of this layer [m].
    pub layer_height: f64,
    /// Average temperature [K].
    pub temperature: f64,
    /// RMS wind speed [m/s].
    pub wind_speed: f64,
    /// Particle dry deposition velocity [m/s].
    pub particle_dry_dep: f64,
    /// SO2 dry deposition velocity [m/s].
    pub so2_dry_dep: f64,
    /// NH3 dry deposition velocity [m/s].
    pub nh3_dry_dep: f64,
    /// VOC dry deposition velocity [m/s].
    pub voc_dry_dep: f64,
    /// NOx dry deposition velocity [m/s].
    pub nox_dry_dep: f64,
    /// Particle wet deposition rate [1/s].
    pub particle_wet_dep: f64,
    /// SO2 wet deposition rate [1/s].
    pub so2_wet_dep: f64,
    /// Wet deposition rate for the remaining gases [1/s].
    pub other_gas_wet_dep: f64,
}

impl CellProperties {
    /// Creates a quiescent box of the given size in `layer`.
    pub fn with_size(dx: f64, dy: f64, dz: f64, layer: usize) -> Self {
        Self {
            dx,
            dy,
            dz,
            layer,
            ..Self::default()
        }
    }

    pub fn volume(&self) -> f64 {
        self.dx * self.dy * self.dz
    }

    pub fn footprint_area(&self) -> f64 {
        self.dx * self.dy
    }

    /// Minimal subset carried by a ghost: size, winds, deviations,
    /// diffusivities, mixing coefficients and layer. Deposition and
    /// meteorological extras are left at zero.
    pub fn boundary_copy(&self) -> Self {
        Self {
            u_avg: self.u_avg,
            v_avg: self.v_avg,
            w_avg: self.w_avg,
            u_deviation: self.u_deviation,
            v_deviation: self.v_deviation,
            w_deviation: self.w_deviation,
            kzz: self.kzz,
            kxxyy: self.kxxyy,
            m2u: self.m2u,
            m2d: self.m2d,
            dx: self.dx,
            dy: self.dy,
            dz: self.dz,
            layer: self.layer,
            layer_height: self.layer_height,
            ..Self::default()
        }
    }
}

/// Variable-length neighbor lists, one per [`Direction`].
#[derive(Debug, Clone, Default)]
pub struct Neighbors([Vec<NeighborRef>; 7]);

impl Neighbors {
    pub fn get(&self, dir: Direction) -> &[NeighborRef] {
        &self.0[dir.index()]
    }

    pub fn push(&mut self, dir: Direction, neighbor: NeighborRef) {
        self.0[dir.index()].push(neighbor);
    }

    pub(crate) fn get_mut(&mut self, dir: Direction) -> &mut Vec<NeighborRef> {
        &mut self.0[dir.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Direction, &NeighborRef)> {
        Direction::ALL
            .into_iter()
            .flat_map(move |d| self.get(d).iter().map(move |n| (d, n)))
    }
}

/// Staggered-grid data for one face, parallel to that face's neighbor list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaceTopology {
    /// Fraction of this cell's face covered by each neighbor, in (0, 1].
    pub fractions: Vec<f64>,
    /// Center-to-center distance to each neighbor [m].
    pub half_distances: Vec<f64>,
    /// Interface diffusivity shared with each neighbor [m²/s].
    pub diffusivities: Vec<f64>,
}

/// Per-direction [`FaceTopology`].
///
/// Ground-level links only carry fractions; their distance and diffusivity
/// arrays stay empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Topology([FaceTopology; 7]);

impl Topology {
    pub fn get(&self, dir: Direction) -> &FaceTopology {
        &self.0[dir.index()]
    }

    pub(crate) fn set(&mut self, dir: Direction, face: FaceTopology) {
        self.0[dir.index()] = face;
    }
}

/// Mutable numeric state of an active cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellState {
    /// Concentrations at the start of the step [μg/m³].
    pub ci: Concentrations,
    /// Concentrations at the end of the step [μg/m³].
    pub cf: Concentrations,
    /// Emissions flux [μg/m³/s].
    pub emis_flux: Concentrations,
}

impl Default for CellState {
    fn default() -> Self {
        Self {
            ci: ZERO_CONCENTRATIONS,
            cf: ZERO_CONCENTRATIONS,
            emis_flux: ZERO_CONCENTRATIONS,
        }
    }
}

/// Population and baseline mortality attached to a cell.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Population {
    /// People per cell, keyed by demographic.
    pub counts: BTreeMap<String, f64>,
    /// Baseline mortality rate [deaths per 100,000 people per year].
    pub mortality_rate: f64,
}

impl Population {
    pub fn count(&self, name: &str) -> f64 {
        self.counts.get(name).copied().unwrap_or(0.0)
    }
}

/// Opaque cell footprint polygon, only passed through to output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellGeometry(pub Vec<[f64; 2]>);

/// One active control volume.
#[derive(Debug)]
pub struct Cell {
    pub props: CellProperties,
    pub neighbors: Neighbors,
    pub topology: Topology,
    pub population: Population,
    pub geometry: CellGeometry,
    state: RwLock<CellState>,
}

impl Cell {
    pub fn new(props: CellProperties) -> Self {
        Self {
            props,
            neighbors: Neighbors::default(),
            topology: Topology::default(),
            population: Population::default(),
            geometry: CellGeometry::default(),
            state: RwLock::new(CellState::default()),
        }
    }

    pub fn with_population(mut self, population: Population) -> Self {
        self.population = population;
        self
    }

    pub fn with_geometry(mut self, geometry: CellGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn layer(&self) -> usize {
        self.props.layer
    }

    /// Shared lock on the concentration state.
    pub fn read(&self) -> RwLockReadGuard<'_, CellState> {
        self.state.read()
    }

    /// Exclusive lock on the concentration state.
    pub fn write(&self) -> RwLockWriteGuard<'_, CellState> {
        self.state.write()
    }

    /// Lock-free access when the caller holds the only reference.
    pub fn state_mut(&mut self) -> &mut CellState {
        self.state.get_mut()
    }
}

/// Synthesized cell beyond the domain edge. Never scheduled, never given
/// neighbors; its concentrations stay zero.
#[derive(Debug, Clone)]
pub struct GhostCell {
    pub props: CellProperties,
    pub concentrations: Concentrations,
}

impl GhostCell {
    pub fn from_cell(cell: &Cell) -> Self {
        Self {
            props: cell.props.boundary_copy(),
            concentrations: ZERO_CONCENTRATIONS,
        }
    }
}
