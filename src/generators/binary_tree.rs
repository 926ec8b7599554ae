use rand::{
    Rng,
    seq::{IndexedRandom, SliceRandom},
};

use super::Carve;
use super::union_find::UnionFind;
use crate::config::DirectionPair;
use crate::maze::{Direction, Grid};

/// Binary tree: every cell links to its neighbor in one of two fixed perpendicular directions.
///
/// In tileable mode edge cells may link through the grid edge to the opposite side, so the
/// layout repeats seamlessly. A union-find guard keeps the wrapped layout free of cycles, and
/// a final pass joins any regions the guard left apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryTree {
    pub directions: DirectionPair,
    pub tileable: bool,
}

impl Carve for BinaryTree {
    fn carve<R: Rng + ?Sized>(&self, grid: &mut Grid, rng: &mut R) {
        if self.tileable {
            self.carve_tileable(grid, rng);
        } else {
            self.carve_bounded(grid, rng);
        }
    }
}

impl BinaryTree {
    fn carve_bounded<R: Rng + ?Sized>(&self, grid: &mut Grid, rng: &mut R) {
        for coord in grid.coords() {
            grid.carve(coord);
            // Neighbors outside the grid are never candidates
            let candidates = self
                .directions
                .directions()
                .into_iter()
                .filter(|&d| grid.neighbor(coord, d).is_some())
                .collect::<Vec<_>>();
            // The corner with no candidates is the root of the tree
            if let Some(&direction) = candidates.choose(rng) {
                grid.open_wall(coord, direction);
            }
        }
    }

    fn carve_tileable<R: Rng + ?Sized>(&self, grid: &mut Grid, rng: &mut R) {
        let mut uf = UnionFind::new(grid.len());

        for coord in grid.coords() {
            grid.carve(coord);
            let idx = grid.ravel_index(coord);
            let candidates = self
                .directions
                .directions()
                .into_iter()
                .filter(|&d| {
                    let target = grid.ravel_index(grid.wrapped_neighbor(coord, d));
                    !uf.same_set(idx, target)
                })
                .collect::<Vec<_>>();
            if let Some(&direction) = candidates.choose(rng) {
                let target = grid.open_wrapped_wall(coord, direction);
                uf.unite(idx, grid.ravel_index(target));
            }
        }

        if uf.sets() > 1 {
            let regions = uf.sets();
            let mut walls = grid
                .coords()
                .flat_map(|coord| self.directions.directions().map(|d| (coord, d)))
                .collect::<Vec<(_, Direction)>>();
            walls.shuffle(rng);
            for (coord, direction) in walls {
                if uf.sets() == 1 {
                    break;
                }
                let target = grid.wrapped_neighbor(coord, direction);
                if uf.unite(grid.ravel_index(coord), grid.ravel_index(target)) {
                    grid.open_wrapped_wall(coord, direction);
                }
            }
            tracing::trace!("[binary tree] stitched {} separate regions", regions);
        }
    }
}
