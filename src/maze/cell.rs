use super::direction::{Direction, DirectionSet};

/// A single maze cell. A fresh cell is an uncarved wall block with every wall closed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    /// The cell has been carved into the maze.
    pub is_path: bool,
    /// The cell can be walked on. Carving sets this together with `is_path`,
    /// imported layouts may set it independently.
    pub is_walkable: bool,
    /// The cell is on an algorithm's frontier or backtracking stack.
    /// Cleared before a grid leaves a carver.
    pub active_path: bool,
    open: DirectionSet,
}

impl Cell {
    pub const WALL: Cell = Cell {
        is_path: false,
        is_walkable: false,
        active_path: false,
        open: DirectionSet::EMPTY,
    };

    /// Directions with no wall towards the neighbor.
    pub fn open_directions(&self) -> DirectionSet {
        self.open
    }

    pub fn is_open(&self, direction: Direction) -> bool {
        self.open.contains(direction)
    }

    pub(super) fn open(&mut self, direction: Direction) -> bool {
        self.open.insert(direction)
    }

    pub(super) fn carve(&mut self) {
        self.is_path = true;
        self.is_walkable = true;
    }
}
