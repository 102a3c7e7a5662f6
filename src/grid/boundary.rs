//! Ghost-cell synthesis on the five open domain edges.
//!
//! Every active cell with an empty West/East/South/North/Above neighbor list
//! receives a freshly synthesized ghost on that side. The link is one-way: the
//! real cell points at the ghost, the ghost knows nothing about the real cell
//! and is never scheduled.

use super::cell::{BoundarySide, Cell, CellProperties, GhostCell, NeighborRef};

/// Ghost collections, one per [`BoundarySide`]. Never mixed into the active
/// cell array.
#[derive(Debug, Clone, Default)]
pub struct Boundaries {
    pub west: Vec<GhostCell>,
    pub east: Vec<GhostCell>,
    pub south: Vec<GhostCell>,
    pub north: Vec<GhostCell>,
    pub top: Vec<GhostCell>,
}

impl Boundaries {
    pub fn side(&self, side: BoundarySide) -> &[GhostCell] {
        match side {
            BoundarySide::West => &self.west,
            BoundarySide::East => &self.east,
            BoundarySide::South => &self.south,
            BoundarySide::North => &self.north,
            BoundarySide::Top => &self.top,
        }
    }

    fn side_mut(&mut self, side: BoundarySide) -> &mut Vec<GhostCell> {
        match side {
            BoundarySide::West => &mut self.west,
            BoundarySide::East => &mut self.east,
            BoundarySide::South => &mut self.south,
            BoundarySide::North => &mut self.north,
            BoundarySide::Top => &mut self.top,
        }
    }

    /// Total number of ghost cells.
    pub fn len(&self) -> usize {
        BoundarySide::ALL.iter().map(|s| self.side(*s).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ghost(&self, side: BoundarySide, index: usize) -> Option<&GhostCell> {
        self.side(side).get(index)
    }

    /// Pushes a ghost on `side` and returns a reference to it.
    fn add(&mut self, side: BoundarySide, ghost: GhostCell) -> NeighborRef {
        let list = self.side_mut(side);
        list.push(ghost);
        NeighborRef::Ghost {
            side,
            index: list.len() - 1,
        }
    }
}

/// Synthesizes ghosts for every open face of `cells`.
pub fn synthesize(cells: &mut [Cell]) -> Boundaries {
    let mut boundaries = Boundaries::default();
    for cell in cells.iter_mut() {
        for side in BoundarySide::ALL {
            let dir = side.direction();
            if !cell.neighbors.get(dir).is_empty() {
                continue;
            }
            let ghost = GhostCell::from_cell(cell);
            let link = boundaries.add(side, ghost);
            cell.neighbors.get_mut(dir).push(link);
        }
    }
    boundaries
}

/// Resolves the physical properties behind a neighbor reference.
///
/// References are produced by the grid builder and [`synthesize`], so an
/// out-of-range index is a construction bug.
pub fn resolve<'a>(
    cells: &'a [Cell],
    boundaries: &'a Boundaries,
    neighbor: &NeighborRef,
) -> &'a CellProperties {
    match *neighbor {
        NeighborRef::Cell(i) => &cells[i].props,
        NeighborRef::Ghost { side, index } => &boundaries.side(side)[index].props,
    }
}
