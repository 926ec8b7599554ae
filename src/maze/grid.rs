use std::collections::VecDeque;

use super::Coord;
use super::cell::Cell;
use super::direction::{Direction, DirectionSet};

/// Fixed-size rectangular array of cells, indexed by `(x, y)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    data: Box<[Cell]>,
    width: u16,
    height: u16,
}

impl Grid {
    /// Creates a grid where every cell is an uncarved wall block.
    pub fn new(width: u16, height: u16) -> Self {
        let data = vec![Cell::WALL; width as usize * height as usize].into_boxed_slice();
        Grid {
            data,
            width,
            height,
        }
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    /// Number of cells in the grid.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn ravel_index(&self, coord: Coord) -> usize {
        // Overflow-safe since width and height are u16 (assuming usize is at least 32 bits)
        coord.1 as usize * self.width as usize + coord.0 as usize
    }

    pub fn unravel_index(&self, index: usize) -> Coord {
        let width = self.width as usize;
        ((index % width) as u16, (index / width) as u16)
    }

    pub fn is_in_bounds(&self, coord: Coord) -> bool {
        coord.0 < self.width && coord.1 < self.height
    }

    /// All coordinates in row-major order.
    pub fn coords(&self) -> impl Iterator<Item = Coord> + use<> {
        let (width, height) = (self.width, self.height);
        (0..height).flat_map(move |y| (0..width).map(move |x| (x, y)))
    }

    pub fn cells(&self) -> &[Cell] {
        &self.data
    }

    /// The adjacent coordinate in `direction`, or `None` past the grid edge.
    pub fn neighbor(&self, coord: Coord, direction: Direction) -> Option<Coord> {
        if !self.is_in_bounds(coord) {
            return None;
        }
        let (x, y) = coord;
        // NOTE: wrapping_sub turns -1 into u16::MAX and saturating_add caps at u16::MAX,
        // both of which are filtered out by the bounds check below.
        let next = match direction {
            Direction::N => (x, y.wrapping_sub(1)),
            Direction::S => (x, y.saturating_add(1)),
            Direction::E => (x.saturating_add(1), y),
            Direction::W => (x.wrapping_sub(1), y),
        };
        self.is_in_bounds(next).then_some(next)
    }

    /// Like [`Grid::neighbor`], but stepping off one edge re-enters from the opposite edge.
    pub fn wrapped_neighbor(&self, coord: Coord, direction: Direction) -> Coord {
        let (x, y) = coord;
        let (w, h) = (self.width as i32, self.height as i32);
        let (dx, dy) = direction.offset();
        (
            (x as i32 + dx).rem_euclid(w) as u16,
            (y as i32 + dy).rem_euclid(h) as u16,
        )
    }

    /// In-bounds neighbors with the direction leading to each.
    pub fn neighbors(&self, coord: Coord) -> impl Iterator<Item = (Direction, Coord)> + '_ {
        Direction::ALL
            .into_iter()
            .filter_map(move |d| self.neighbor(coord, d).map(|n| (d, n)))
    }

    pub fn open_directions(&self, coord: Coord) -> DirectionSet {
        self[coord].open_directions()
    }

    /// Directions whose in-bounds neighbor is a carved path cell, walls or not.
    pub fn touching_paths(&self, coord: Coord) -> DirectionSet {
        self.neighbors(coord)
            .filter(|&(_, n)| self[n].is_path)
            .map(|(d, _)| d)
            .collect()
    }

    /// A cell with no open direction at all.
    pub fn is_enclosed(&self, coord: Coord) -> bool {
        self.open_directions(coord).is_empty()
    }

    /// Marks a cell as carved into the maze.
    pub fn carve(&mut self, coord: Coord) {
        let idx = self.ravel_index(coord);
        self.data[idx].carve();
    }

    pub fn set_active(&mut self, coord: Coord, active: bool) {
        let idx = self.ravel_index(coord);
        self.data[idx].active_path = active;
    }

    pub fn clear_active_paths(&mut self) {
        self.data.iter_mut().for_each(|cell| cell.active_path = false);
    }

    /// Opens the wall between `coord` and its neighbor in `direction`, on both sides.
    /// Returns the neighbor, or `None` when there is no neighbor in that direction.
    pub fn open_wall(&mut self, coord: Coord, direction: Direction) -> Option<Coord> {
        let next = self.neighbor(coord, direction)?;
        self.open_between(coord, next, direction);
        Some(next)
    }

    /// Opens the wall in `direction`, wrapping around the grid edge if needed.
    pub fn open_wrapped_wall(&mut self, coord: Coord, direction: Direction) -> Coord {
        let next = self.wrapped_neighbor(coord, direction);
        self.open_between(coord, next, direction);
        next
    }

    /// Opens the wall between two adjacent cells.
    ///
    /// # Returns
    /// `true` if a wall was removed, `false` if the cells were already connected
    ///
    /// # Panics
    /// * If either coordinate is out of bounds
    /// * If the cells are not orthogonally adjacent
    pub fn connect(&mut self, a: Coord, b: Coord) -> bool {
        if !self.is_in_bounds(a) || !self.is_in_bounds(b) {
            panic!("The given coordinate is out of bounds");
        }
        let direction = Direction::ALL
            .into_iter()
            .find(|&d| self.neighbor(a, d) == Some(b))
            .unwrap_or_else(|| panic!("Cells {:?} and {:?} are not adjacent", a, b));
        self.open_between(a, b, direction)
    }

    fn open_between(&mut self, a: Coord, b: Coord, direction: Direction) -> bool {
        let (ia, ib) = (self.ravel_index(a), self.ravel_index(b));
        let opened = self.data[ia].open(direction);
        self.data[ib].open(direction.opposite());
        opened
    }

    /// Where an open wall in `direction` leads: the adjacent cell, or the wrapped one
    /// for walls opened through the grid edge.
    pub fn step(&self, coord: Coord, direction: Direction) -> Coord {
        self.neighbor(coord, direction)
            .unwrap_or_else(|| self.wrapped_neighbor(coord, direction))
    }

    /// Number of open connections. Each connection is counted once.
    pub fn edge_count(&self) -> usize {
        self.data.iter().map(|c| c.open_directions().len()).sum::<usize>() / 2
    }

    /// Breadth-first reachability over open connections.
    pub fn reachable_from(&self, start: Coord) -> Vec<bool> {
        let mut seen = vec![false; self.len()];
        if !self.is_in_bounds(start) {
            return seen;
        }
        seen[self.ravel_index(start)] = true;
        let mut queue = VecDeque::from([start]);
        while let Some(coord) = queue.pop_front() {
            for d in self.open_directions(coord).iter() {
                let next = self.step(coord, d);
                let idx = self.ravel_index(next);
                if !seen[idx] {
                    seen[idx] = true;
                    queue.push_back(next);
                }
            }
        }
        seen
    }

    /// Every cell can reach every other cell.
    pub fn is_connected(&self) -> bool {
        !self.is_empty() && self.reachable_from((0, 0)).iter().all(|&r| r)
    }

    /// Connected with exactly `len - 1` connections: a spanning tree.
    pub fn is_perfect(&self) -> bool {
        self.is_connected() && self.edge_count() == self.len() - 1
    }

    /// Every open direction is mirrored by the opposite direction on the other side.
    pub fn is_symmetric(&self) -> bool {
        self.coords().all(|coord| {
            self.open_directions(coord)
                .iter()
                .all(|d| self[self.step(coord, d)].is_open(d.opposite()))
        })
    }
}

impl std::ops::Index<Coord> for Grid {
    type Output = Cell;

    fn index(&self, index: Coord) -> &Self::Output {
        &self.data[self.ravel_index(index)]
    }
}

impl std::ops::IndexMut<Coord> for Grid {
    fn index_mut(&mut self, index: Coord) -> &mut Self::Output {
        let idx = self.ravel_index(index);
        &mut self.data[idx]
    }
}
