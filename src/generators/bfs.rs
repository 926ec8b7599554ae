use std::collections::VecDeque;

use rand::Rng;

use super::{Carve, random_start, unvisited_neighbors};
use crate::config::Bias;
use crate::maze::{Direction, Grid};

/// Randomized breadth-first growth: the maze spreads out in rings from the start cell.
///
/// Under a bias the pick favours the bias direction, and a child carved across the bias
/// axis jumps to the front of the queue. The frontier then spreads sideways into a wide
/// front that advances along the bias axis, which stretches corridors along that axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreadthFirst {
    pub bias: Bias,
}

impl Carve for BreadthFirst {
    fn carve<R: Rng + ?Sized>(&self, grid: &mut Grid, rng: &mut R) {
        let start = random_start(grid, rng);
        grid.carve(start);
        grid.set_active(start, true);

        // The queue only holds path cells that may still have uncarved neighbors
        let mut frontier = VecDeque::from([start]);

        while let Some(cell) = frontier.pop_front() {
            let neighbors = unvisited_neighbors(grid, cell);
            let Some(idx) = self.bias.choose_index(neighbors.iter().map(|&(d, _)| d), rng) else {
                // Nothing left to carve from here
                grid.set_active(cell, false);
                continue;
            };

            let (direction, next) = neighbors[idx];
            grid.open_wall(cell, direction);
            grid.carve(next);
            grid.set_active(next, true);
            if self.crosses_bias_axis(direction) {
                frontier.push_front(next);
            } else {
                frontier.push_back(next);
            }

            // Requeue the cell behind its new child so growth stays ring-shaped
            if neighbors.len() > 1 {
                frontier.push_back(cell);
            } else {
                grid.set_active(cell, false);
            }
        }
        tracing::trace!("[bfs] carved {} connections", grid.edge_count());
    }
}

impl BreadthFirst {
    fn crosses_bias_axis(&self, direction: Direction) -> bool {
        self.bias
            .direction
            .is_some_and(|d| d.is_vertical() != direction.is_vertical())
    }
}
