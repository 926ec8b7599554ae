use rand::{Rng, seq::IndexedRandom};

use crate::maze::Grid;

/// Gives a maze more than one route between cells.
///
/// On a carved grid ([`inject`](Self::inject)) some straight corridor cells become
/// junctions by opening one side wall each. Cells are visited in row-major order and the
/// corridor pattern is checked against the grid as it stands at that moment. Only cells
/// whose open directions are exactly {N, S} or exactly {W, E} are eligible. Each eligible
/// cell opens a side wall with probability `1 / loop_chance`, towards a side whose
/// neighbor is a carved path cell.
///
/// A cell opens at most one wall, so even at `loop_chance` 1 the number of openings is
/// bounded by the cells that are straight when visited. That is no more than the straight
/// cells plus the dead ends before the pass: an opening turns its own cell into a junction
/// and can only make a later cell straight if that cell was a dead end. It is usually less
/// than one per straight cell, since an opening also turns the neighbor it reaches into a
/// junction.
///
/// On a wall-block layout ([`inject_blocks`](Self::inject_blocks)) a wall block whose path
/// neighbors lie exactly N and S, or exactly W and E, becomes a path joining both sides.
pub struct LoopInjector {
    loop_chance: u32,
}

impl LoopInjector {
    /// `loop_chance` is clamped to at least 1, which opens every eligible corridor.
    pub fn new(loop_chance: u32) -> Self {
        LoopInjector {
            loop_chance: loop_chance.max(1),
        }
    }

    pub fn apply<R: Rng + ?Sized>(&self, mut grid: Grid, rng: &mut R) -> Grid {
        let loops = self.inject(&mut grid, rng);
        tracing::debug!(
            "[loops] opened {} side walls (1 in {} chance)",
            loops,
            self.loop_chance
        );
        grid
    }

    /// Same as [`apply`](Self::apply) for a grid imported from a wall-block layout.
    pub fn apply_blocks<R: Rng + ?Sized>(&self, mut grid: Grid, rng: &mut R) -> Grid {
        let loops = self.inject_blocks(&mut grid, rng);
        tracing::debug!(
            "[loops] turned {} wall blocks into paths (1 in {} chance)",
            loops,
            self.loop_chance
        );
        grid
    }

    /// Runs the pass in place and returns the number of walls opened.
    pub fn inject<R: Rng + ?Sized>(&self, grid: &mut Grid, rng: &mut R) -> usize {
        let mut opened = 0;
        for coord in grid.coords() {
            let open = grid.open_directions(coord);
            if !open.is_straight() {
                continue;
            }
            if rng.random_range(1..=self.loop_chance) != 1 {
                continue;
            }
            let Some(corridor) = open.iter().next() else {
                continue;
            };
            let touching = grid.touching_paths(coord);
            let sides = corridor
                .perpendicular()
                .into_iter()
                .filter(|&d| touching.contains(d))
                .collect::<Vec<_>>();
            let Some(&side) = sides.choose(rng) else {
                continue;
            };
            if grid.open_wall(coord, side).is_some() {
                opened += 1;
            }
        }
        opened
    }

    /// Runs the wall-block pass in place and returns the number of blocks turned into paths.
    pub fn inject_blocks<R: Rng + ?Sized>(&self, grid: &mut Grid, rng: &mut R) -> usize {
        let mut opened = 0;
        for coord in grid.coords() {
            if grid[coord].is_path {
                continue;
            }
            let touching = grid.touching_paths(coord);
            if !touching.is_straight() {
                continue;
            }
            if rng.random_range(1..=self.loop_chance) != 1 {
                continue;
            }
            grid.carve(coord);
            for direction in touching.iter() {
                grid.open_wall(coord, direction);
            }
            opened += 1;
        }
        opened
    }
}

/// Convenience wrapper around [`LoopInjector::apply`].
pub fn add_loops<R: Rng + ?Sized>(grid: Grid, loop_chance: u32, rng: &mut R) -> Grid {
    LoopInjector::new(loop_chance).apply(grid, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Algorithm, Config};
    use crate::generators::Carver;
    use crate::maze::Direction;
    use rand::{SeedableRng, rngs::StdRng};

    fn carved(algorithm: Algorithm, width: u16, height: u16, seed: u64) -> Grid {
        let config = Config::new(width, height, algorithm);
        let mut rng = StdRng::seed_from_u64(seed);
        Carver::from_config(&config).generate(Grid::new(width, height), &mut rng)
    }

    /// 3x3 with a single vertical corridor through the middle column
    fn comb() -> Grid {
        let mut grid = Grid::new(3, 3);
        grid.coords().for_each(|c| grid.carve(c));
        grid.connect((1, 0), (1, 1));
        grid.connect((1, 1), (1, 2));
        grid.connect((0, 0), (1, 0));
        grid.connect((0, 0), (0, 1));
        grid.connect((0, 1), (0, 2));
        grid.connect((1, 2), (2, 2));
        grid.connect((2, 2), (2, 1));
        grid.connect((2, 1), (2, 0));
        grid
    }

    #[test]
    fn test_opens_every_corridor_when_certain() {
        let mut grid = comb();
        assert!(grid.is_perfect());
        let mut rng = StdRng::seed_from_u64(0);
        let opened = LoopInjector::new(1).inject(&mut grid, &mut rng);
        // Row 1 is three {N, S} corridors. (0, 1) can only open east, which turns (1, 1)
        // into a junction before it is visited. (2, 1) can only open west.
        assert_eq!(opened, 2);
        assert_eq!(grid.edge_count(), 10);
        assert_eq!(grid.open_directions((0, 1)).len(), 3);
        assert_eq!(grid.open_directions((1, 1)).len(), 4);
        assert_eq!(grid.open_directions((2, 1)).len(), 3);
        assert!(grid.is_connected());
        assert!(grid.is_symmetric());
    }

    #[test]
    fn test_every_opening_adds_one_edge() {
        for algorithm in Algorithm::ALL {
            let mut grid = carved(algorithm, 15, 12, 3);
            let before = grid.edge_count();
            let mut rng = StdRng::seed_from_u64(3);
            let opened = LoopInjector::new(1).inject(&mut grid, &mut rng);
            assert_eq!(grid.edge_count(), before + opened, "{}", algorithm);
        }
    }

    #[test]
    fn test_backtracker_corridors_get_loops() {
        let mut grid = carved(Algorithm::DepthFirst, 20, 20, 8);
        let straight_before = grid
            .coords()
            .filter(|&c| grid.open_directions(c).is_straight())
            .count();
        let mut rng = StdRng::seed_from_u64(8);
        let opened = LoopInjector::new(1).inject(&mut grid, &mut rng);
        assert!(straight_before > 0);
        assert!(opened > 0);
    }

    #[test]
    fn test_openings_are_bounded_by_eligible_cells() {
        for algorithm in Algorithm::ALL {
            for seed in 0..5 {
                let mut grid = carved(algorithm, 20, 20, seed);
                let straight = grid
                    .coords()
                    .filter(|&c| grid.open_directions(c).is_straight())
                    .count();
                let dead_ends = grid
                    .coords()
                    .filter(|&c| grid.open_directions(c).len() == 1)
                    .count();
                let mut rng = StdRng::seed_from_u64(seed);
                let opened = LoopInjector::new(1).inject(&mut grid, &mut rng);
                assert!(
                    opened <= straight + dead_ends,
                    "{}: {} openings from {} straight cells and {} dead ends",
                    algorithm,
                    opened,
                    straight,
                    dead_ends
                );
                // Every cell that opened is a junction now
                assert!(opened <= grid.coords().filter(|&c| grid.open_directions(c).len() >= 3).count());
            }
        }
    }

    fn blocks(grid: &Grid) -> Grid {
        crate::list::export_blocks(grid).unwrap().into_grid().unwrap()
    }

    #[test]
    fn test_wall_blocks_between_paths_open() {
        // path, wall, path in a row; the bottom row is all wall
        let mut grid = Grid::new(3, 2);
        grid.carve((0, 0));
        grid.carve((2, 0));
        let mut rng = StdRng::seed_from_u64(0);
        let opened = LoopInjector::new(1).inject_blocks(&mut grid, &mut rng);
        assert_eq!(opened, 1);
        assert!(grid[(1, 0)].is_path);
        assert!(grid[(1, 0)].is_open(Direction::W) && grid[(1, 0)].is_open(Direction::E));
        assert!(!grid[(1, 1)].is_path);
        assert!(grid.is_symmetric());
    }

    #[test]
    fn test_wall_blocks_at_a_bend_stay() {
        let mut grid = Grid::new(2, 2);
        grid.carve((1, 0));
        grid.carve((0, 1));
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(LoopInjector::new(1).inject_blocks(&mut grid, &mut rng), 0);
        assert!(!grid[(0, 0)].is_path && !grid[(1, 1)].is_path);
    }

    #[test]
    fn test_block_layout_gets_loops() {
        for algorithm in Algorithm::ALL {
            let mut grid = blocks(&carved(algorithm, 12, 10, 6));
            let paths_before = grid.cells().iter().filter(|c| c.is_path).count();
            let mut rng = StdRng::seed_from_u64(6);
            let opened = LoopInjector::new(1).inject_blocks(&mut grid, &mut rng);
            assert!(opened > 0, "{}", algorithm);

            let paths = grid.cells().iter().filter(|c| c.is_path).count();
            assert_eq!(paths, paths_before + opened);
            // Each new block joins two parts of a tree, closing one loop
            assert_eq!(grid.edge_count(), paths - 1 + opened);
            let reached = grid.reachable_from((1, 1));
            assert!(reached.iter().zip(grid.cells()).all(|(&r, cell)| r == cell.is_path));
            assert!(grid.is_symmetric());
        }
    }

    #[test]
    fn test_block_loops_respect_chance() {
        let base = blocks(&carved(Algorithm::DepthFirst, 30, 30, 4));
        let count = |chance: u32| {
            let mut grid = base.clone();
            let mut rng = StdRng::seed_from_u64(9);
            LoopInjector::new(chance).inject_blocks(&mut grid, &mut rng)
        };
        assert!(count(1) > count(10));
        assert!(count(10) > 0);
    }

    #[test]
    fn test_loops_keep_maze_connected() {
        for algorithm in Algorithm::ALL {
            for chance in [1, 2, 5, 50] {
                let grid = carved(algorithm, 20, 20, 11);
                let before = grid.edge_count();
                let mut rng = StdRng::seed_from_u64(chance as u64);
                let grid = add_loops(grid, chance, &mut rng);
                assert!(grid.edge_count() >= before);
                assert!(grid.is_connected());
                assert!(grid.is_symmetric());
            }
        }
    }

    #[test]
    fn test_higher_chance_means_fewer_loops() {
        let base = carved(Algorithm::DepthFirst, 40, 40, 2);
        let count = |chance: u32| {
            let mut grid = base.clone();
            let mut rng = StdRng::seed_from_u64(5);
            LoopInjector::new(chance).inject(&mut grid, &mut rng)
        };
        assert!(count(1) > count(20));
    }

    #[test]
    fn test_two_by_two_is_untouched() {
        for algorithm in Algorithm::ALL {
            for seed in 0..10 {
                let grid = carved(algorithm, 2, 2, seed);
                let mut rng = StdRng::seed_from_u64(seed);
                let grid = add_loops(grid, 1, &mut rng);
                assert_eq!(grid.edge_count(), 3);
            }
        }
    }

    #[test]
    fn test_only_straight_cells_change() {
        let mut grid = Grid::new(3, 2);
        grid.coords().for_each(|c| grid.carve(c));
        // Dead ends and bends only: (0,0)-(1,0)-(1,1)-(2,1), (0,1) hangs off (0,0), (2,0) off (2,1)
        grid.connect((0, 0), (1, 0));
        grid.connect((1, 0), (1, 1));
        grid.connect((1, 1), (2, 1));
        grid.connect((0, 0), (0, 1));
        grid.connect((2, 1), (2, 0));
        let before = grid.clone();
        let mut rng = StdRng::seed_from_u64(0);
        let grid = add_loops(grid, 1, &mut rng);
        assert_eq!(grid, before);
        assert!(!grid[(1, 0)].is_open(Direction::E));
    }
}
