use rand::Rng;

mod bfs;
mod bias;
mod binary_tree;
mod dfs;
mod ellers;
mod kruskal;
mod prim;
pub(crate) mod union_find;

pub use bfs::BreadthFirst;
pub use binary_tree::BinaryTree;
pub use dfs::DepthFirst;
pub use ellers::Ellers;
pub use kruskal::Kruskals;
pub use prim::Prims;

use crate::config::{Algorithm, Config};
use crate::maze::{Coord, Direction, Grid};

/// A maze carving strategy. Turns an empty grid into a perfect maze in place.
pub trait Carve {
    fn carve<R: Rng + ?Sized>(&self, grid: &mut Grid, rng: &mut R);
}

/// One carver per supported algorithm, selected once from the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Carver {
    BreadthFirst(BreadthFirst),
    DepthFirst(DepthFirst),
    Prims(Prims),
    Kruskals(Kruskals),
    Ellers(Ellers),
    BinaryTree(BinaryTree),
}

impl Carver {
    pub fn from_config(config: &Config) -> Self {
        let bias = config.bias;
        match config.algorithm {
            Algorithm::BreadthFirst => Carver::BreadthFirst(BreadthFirst { bias }),
            Algorithm::DepthFirst => Carver::DepthFirst(DepthFirst { bias }),
            Algorithm::Prims => Carver::Prims(Prims { bias }),
            Algorithm::Kruskals => Carver::Kruskals(Kruskals),
            Algorithm::Ellers => Carver::Ellers(Ellers { bias }),
            Algorithm::BinaryTree => Carver::BinaryTree(BinaryTree {
                directions: config.binary_tree.directions,
                tileable: config.binary_tree.tileable,
            }),
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        match self {
            Carver::BreadthFirst(_) => Algorithm::BreadthFirst,
            Carver::DepthFirst(_) => Algorithm::DepthFirst,
            Carver::Prims(_) => Algorithm::Prims,
            Carver::Kruskals(_) => Algorithm::Kruskals,
            Carver::Ellers(_) => Algorithm::Ellers,
            Carver::BinaryTree(_) => Algorithm::BinaryTree,
        }
    }

    /// Carves `grid` and hands it back with all transient frontier marks cleared.
    pub fn generate<R: Rng + ?Sized>(&self, mut grid: Grid, rng: &mut R) -> Grid {
        if grid.is_empty() {
            return grid;
        }
        match self {
            Carver::BreadthFirst(c) => c.carve(&mut grid, rng),
            Carver::DepthFirst(c) => c.carve(&mut grid, rng),
            Carver::Prims(c) => c.carve(&mut grid, rng),
            Carver::Kruskals(c) => c.carve(&mut grid, rng),
            Carver::Ellers(c) => c.carve(&mut grid, rng),
            Carver::BinaryTree(c) => c.carve(&mut grid, rng),
        }
        grid.clear_active_paths();
        grid
    }
}

/// Random starting cell.
fn random_start<R: Rng + ?Sized>(grid: &Grid, rng: &mut R) -> Coord {
    (
        rng.random_range(0..grid.width()),
        rng.random_range(0..grid.height()),
    )
}

/// In-bounds neighbors that have not been carved yet.
fn unvisited_neighbors(grid: &Grid, coord: Coord) -> Vec<(Direction, Coord)> {
    grid.neighbors(coord)
        .filter(|&(_, n)| !grid[n].is_path)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DirectionPair;
    use rand::{SeedableRng, rngs::StdRng};

    fn configs(width: u16, height: u16) -> Vec<Config> {
        let mut configs = Algorithm::ALL
            .into_iter()
            .map(|a| Config::new(width, height, a))
            .collect::<Vec<_>>();
        // Biased variants for the carvers that honour bias
        for a in [
            Algorithm::BreadthFirst,
            Algorithm::DepthFirst,
            Algorithm::Prims,
            Algorithm::Ellers,
        ] {
            for d in Direction::ALL {
                configs.push(Config::new(width, height, a).with_bias(Some(d), 6));
            }
        }
        for pair in ["NE", "NW", "SE", "SW"] {
            let pair = pair.parse::<DirectionPair>().unwrap();
            configs.push(Config::new(width, height, Algorithm::BinaryTree).with_binary_tree(pair, false));
        }
        configs
    }

    fn carve(config: &Config, seed: u64) -> Grid {
        let mut rng = StdRng::seed_from_u64(seed);
        Carver::from_config(config).generate(Grid::new(config.width, config.height), &mut rng)
    }

    #[test]
    fn test_every_carver_builds_a_spanning_tree() {
        for (width, height) in [(2, 2), (2, 7), (7, 2), (5, 5), (13, 9), (32, 17)] {
            for config in configs(width, height) {
                for seed in 0..3 {
                    let grid = carve(&config, seed);
                    assert!(
                        grid.is_connected(),
                        "{} {}x{} seed {} is not connected",
                        config.algorithm,
                        width,
                        height,
                        seed
                    );
                    assert_eq!(
                        grid.edge_count(),
                        grid.len() - 1,
                        "{} {}x{} seed {} has a cycle",
                        config.algorithm,
                        width,
                        height,
                        seed
                    );
                    assert!(grid.is_symmetric());
                }
            }
        }
    }

    #[test]
    fn test_extreme_bias_strengths_build_trees() {
        for a in [
            Algorithm::BreadthFirst,
            Algorithm::DepthFirst,
            Algorithm::Prims,
            Algorithm::Ellers,
        ] {
            for strength in [1, 2, u32::MAX / 2, u32::MAX - 1, u32::MAX] {
                for d in Direction::ALL {
                    let config = Config::new(10, 10, a).with_bias(Some(d), strength);
                    let grid = carve(&config, 1);
                    assert!(
                        grid.is_perfect(),
                        "{} biased {} at {} is not a spanning tree",
                        a,
                        d,
                        strength
                    );
                }
            }
        }
    }

    #[test]
    fn test_carved_cells_are_paths_and_frontier_is_cleared() {
        for config in configs(9, 6) {
            let grid = carve(&config, 42);
            assert!(grid.cells().iter().all(|c| c.is_path && c.is_walkable));
            assert!(grid.cells().iter().all(|c| !c.active_path));
        }
    }

    #[test]
    fn test_two_by_two_has_three_edges() {
        for config in configs(2, 2) {
            for seed in 0..10 {
                assert_eq!(carve(&config, seed).edge_count(), 3);
            }
        }
    }

    #[test]
    fn test_same_seed_same_maze() {
        for config in configs(12, 8) {
            assert_eq!(carve(&config, 1234), carve(&config, 1234));
        }
    }

    #[test]
    fn test_seeds_differ() {
        for algorithm in Algorithm::ALL {
            let config = Config::new(16, 16, algorithm);
            let distinct = (0..5)
                .map(|seed| carve(&config, seed))
                .collect::<Vec<_>>()
                .windows(2)
                .any(|pair| pair[0] != pair[1]);
            assert!(distinct, "{} ignores its random source", algorithm);
        }
    }

    #[test]
    fn test_carver_matches_algorithm() {
        for algorithm in Algorithm::ALL {
            let carver = Carver::from_config(&Config::new(4, 4, algorithm));
            assert_eq!(carver.algorithm(), algorithm);
        }
    }
}
