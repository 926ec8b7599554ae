use std::collections::BTreeMap;

use rand::{Rng, seq::SliceRandom};

use super::Carve;
use super::union_find::UnionFind;
use crate::config::Bias;
use crate::maze::{Direction, Grid};

/// Eller's algorithm: builds the maze one row at a time, tracking which cells of the
/// current row are already joined.
///
/// An E/W bias favours merging along rows, an N/S bias favours extra drops to the next row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ellers {
    pub bias: Bias,
}

impl Carve for Ellers {
    fn carve<R: Rng + ?Sized>(&self, grid: &mut Grid, rng: &mut R) {
        let width = grid.width();
        let height = grid.height();
        let merge_probability = self.bias.axis_probability(false);
        let drop_probability = self.bias.axis_probability(true);

        let mut uf = UnionFind::new(grid.len());

        for y in 0..height {
            let last_row = y + 1 == height;
            (0..width).for_each(|x| {
                grid.carve((x, y));
                grid.set_active((x, y), true);
            });

            // Join adjacent cells of different sets. The last row joins all of them.
            for x in 0..width - 1 {
                let (a, b) = (grid.ravel_index((x, y)), grid.ravel_index((x + 1, y)));
                if uf.same_set(a, b) {
                    continue;
                }
                if last_row || rng.random_bool(merge_probability) {
                    uf.unite(a, b);
                    grid.open_wall((x, y), Direction::E);
                }
            }

            if !last_row {
                // Every set needs at least one way down. BTreeMap keeps the order seed-stable.
                let mut sets: BTreeMap<usize, Vec<u16>> = BTreeMap::new();
                for x in 0..width {
                    let root = uf.find(grid.ravel_index((x, y)));
                    sets.entry(root).or_default().push(x);
                }
                for members in sets.values_mut() {
                    members.shuffle(rng);
                    for (i, &x) in members.iter().enumerate() {
                        if i == 0 || rng.random_bool(drop_probability) {
                            let below = grid.ravel_index((x, y + 1));
                            uf.unite(grid.ravel_index((x, y)), below);
                            grid.open_wall((x, y), Direction::S);
                        }
                    }
                }
            }

            (0..width).for_each(|x| grid.set_active((x, y), false));
        }
        tracing::trace!("[ellers] {} sets left", uf.sets());
    }
}
