use rand::Rng;

use super::{Carve, random_start, unvisited_neighbors};
use crate::config::Bias;
use crate::maze::Grid;

/// Recursive backtracker, run on an explicit stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthFirst {
    pub bias: Bias,
}

impl Carve for DepthFirst {
    fn carve<R: Rng + ?Sized>(&self, grid: &mut Grid, rng: &mut R) {
        let start = random_start(grid, rng);
        grid.carve(start);
        grid.set_active(start, true);

        // Initialize the stack with the starting point
        // The stack will keep only path cells
        let mut stack = vec![start];

        while let Some(cell) = stack.pop() {
            let neighbors = unvisited_neighbors(grid, cell);

            match self.bias.choose_index(neighbors.iter().map(|&(d, _)| d), rng) {
                Some(idx) => {
                    let (direction, next) = neighbors[idx];
                    grid.open_wall(cell, direction);
                    grid.carve(next);
                    grid.set_active(next, true);
                    // Put the cell back first so we can look at another neighbor of this cell later
                    stack.push(cell);
                    // Put the neighbor to carve the maze in that neighbor's direction
                    stack.push(next);
                }
                None => {
                    // Dead end, backtrack
                    grid.set_active(cell, false);
                }
            }
        }
        tracing::trace!("[dfs] carved {} connections", grid.edge_count());
    }
}
