//! Staggered-grid distances, overlap fractions and interface diffusivities.
//!
//! Each cell's arrays depend only on the cell and its own neighbors, so the
//! computation runs in parallel with no locking.
//!
//! Fractions on one face are computed independently per neighbor and are not
//! renormalized; a face may border any number of sub-resolution neighbors.

use rayon::prelude::*;

use super::boundary::{Boundaries, resolve};
use super::cell::{Cell, CellProperties, Direction, FaceTopology, Topology};
use crate::vecutils::harmonic_mean;

/// Computes and stores the topology of every cell.
pub fn build(cells: &mut [Cell], boundaries: &Boundaries) {
    let computed: Vec<Topology> = {
        let view: &[Cell] = cells;
        view.par_iter()
            .map(|cell| compute(cell, view, boundaries))
            .collect()
    };
    for (cell, topology) in cells.iter_mut().zip(computed) {
        cell.topology = topology;
    }
}

/// Topology of a single cell.
pub fn compute(cell: &Cell, cells: &[Cell], boundaries: &Boundaries) -> Topology {
    let mut topology = Topology::default();
    for dir in Direction::ALL {
        let mut face = FaceTopology::default();
        for link in cell.neighbors.get(dir) {
            let other = resolve(cells, boundaries, link);
            face.fractions.push(overlap_fraction(&cell.props, other, dir));
            if dir != Direction::GroundLevel {
                face.half_distances.push(half_distance(&cell.props, other, dir));
                face.diffusivities
                    .push(interface_diffusivity(&cell.props, other, dir));
            }
        }
        topology.set(dir, face);
    }
    topology
}

/// Mean of the two extents along the axis crossing the face.
pub fn half_distance(cell: &CellProperties, other: &CellProperties, dir: Direction) -> f64 {
    match dir {
        Direction::West | Direction::East => (cell.dx + other.dx) / 2.0,
        Direction::South | Direction::North => (cell.dy + other.dy) / 2.0,
        Direction::Below | Direction::Above | Direction::GroundLevel => (cell.dz + other.dz) / 2.0,
    }
}

/// Share of this cell's face covered by `other`, capped at 1.
pub fn overlap_fraction(cell: &CellProperties, other: &CellProperties, dir: Direction) -> f64 {
    let ratio = match dir {
        Direction::West | Direction::East => other.dy / cell.dy,
        Direction::South | Direction::North => other.dx / cell.dx,
        Direction::Below | Direction::Above | Direction::GroundLevel => {
            other.footprint_area() / cell.footprint_area()
        }
    };
    ratio.min(1.0)
}

/// Harmonic mean of the two center diffusivities normal to the face.
pub fn interface_diffusivity(
    cell: &CellProperties,
    other: &CellProperties,
    dir: Direction,
) -> f64 {
    match dir {
        Direction::Below | Direction::Above | Direction::GroundLevel => {
            harmonic_mean(cell.kzz, other.kzz)
        }
        _ => harmonic_mean(cell.kxxyy, other.kxxyy),
    }
}
