//! Grid data model: cells, neighbor graph, ghost boundaries and topology.
//!
//! # Architecture
//!
//! ```text
//! Vec<Cell> ──► Domain::new() ──► validate ─► sort by layer ─► boundary::synthesize()
//!                                                               │
//!                                                     topology::build()
//! ```
//!
//! Neighbors are integer indices into the active cell array or into one of the
//! five ghost collections, so the graph carries no ownership cycles.

pub mod boundary;
pub mod cell;
pub mod domain;
pub mod regular;
pub mod topology;

pub use boundary::Boundaries;
pub use cell::{
    BoundarySide, Cell, CellGeometry, CellProperties, CellState, Direction, FaceTopology,
    GhostCell, NeighborRef, Neighbors, Population, Topology,
};
pub use domain::{BoundaryMode, Domain};
pub use regular::RegularGrid;
