use rand::{
    Rng,
    distr::{Distribution, weighted::WeightedIndex},
};

use super::{Carve, random_start, unvisited_neighbors};
use crate::config::Bias;
use crate::maze::{Coord, Direction, Grid};

/// Randomized Prim's: grows the maze by opening random walls on its boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prims {
    pub bias: Bias,
}

/// Walls on the boundary of the carved region, bucketed by the direction they face
/// so a biased pick costs the same as an unbiased one.
struct WallFrontier {
    buckets: [Vec<Coord>; 4],
}

impl WallFrontier {
    fn new() -> Self {
        WallFrontier {
            buckets: Default::default(),
        }
    }

    fn push(&mut self, from: Coord, direction: Direction) {
        self.buckets[direction.index()].push(from);
    }

    /// Removes and returns a random wall. Each wall's chance is proportional to the
    /// bias weight of the direction it faces.
    fn pop_random<R: Rng + ?Sized>(&mut self, bias: &Bias, rng: &mut R) -> Option<(Coord, Direction)> {
        // Bucket length times weight can pass u64::MAX on the largest grids
        let mass = Direction::ALL
            .map(|d| self.buckets[d.index()].len() as f64 * f64::from(bias.weight(d)));
        // Fails only when every bucket is empty
        let direction = Direction::ALL[WeightedIndex::new(mass).ok()?.sample(rng)];
        let bucket = &mut self.buckets[direction.index()];
        let idx = rng.random_range(0..bucket.len());
        Some((bucket.swap_remove(idx), direction))
    }
}

impl Carve for Prims {
    fn carve<R: Rng + ?Sized>(&self, grid: &mut Grid, rng: &mut R) {
        let start = random_start(grid, rng);
        grid.carve(start);

        let mut frontier = WallFrontier::new();
        push_walls(grid, start, &mut frontier);

        while let Some((from, direction)) = frontier.pop_random(&self.bias, rng) {
            let Some(next) = grid.neighbor(from, direction) else {
                continue;
            };
            // Another wall already reached this cell
            if grid[next].is_path {
                continue;
            }
            grid.open_wall(from, direction);
            grid.carve(next);
            grid.set_active(next, false);
            push_walls(grid, next, &mut frontier);
        }
        tracing::trace!("[prims] carved {} connections", grid.edge_count());
    }
}

/// Adds the walls between `from` and its uncarved neighbors to the frontier,
/// marking those neighbors as frontier cells.
fn push_walls(grid: &mut Grid, from: Coord, frontier: &mut WallFrontier) {
    for (direction, neighbor) in unvisited_neighbors(grid, from) {
        grid.set_active(neighbor, true);
        frontier.push(from, direction);
    }
}
