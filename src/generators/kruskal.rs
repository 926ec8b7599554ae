use rand::{Rng, seq::SliceRandom};

use super::Carve;
use super::union_find::UnionFind;
use crate::maze::{Coord, Direction, Grid};

/// Randomized Kruskal's: opens walls in shuffled order whenever they join two separate regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Kruskals;

/// Wall between a cell and its east or south neighbor
#[derive(Clone, Copy)]
struct Edge {
    from: Coord,
    direction: Direction,
}

impl Carve for Kruskals {
    fn carve<R: Rng + ?Sized>(&self, grid: &mut Grid, rng: &mut R) {
        let width = grid.width();
        let height = grid.height();

        grid.coords().for_each(|coord| grid.carve(coord));

        // Initialize Union-Find for all cells
        let mut uf = UnionFind::new(grid.len());

        // Collect all possible edges (walls between adjacent cells)
        let mut edges: Vec<Edge> = grid
            .coords()
            .flat_map(|(x, y)| {
                [
                    (x + 1 < width).then_some(Edge {
                        from: (x, y),
                        direction: Direction::E,
                    }),
                    (y + 1 < height).then_some(Edge {
                        from: (x, y),
                        direction: Direction::S,
                    }),
                ]
            })
            .flatten()
            .collect();

        // Shuffle edges randomly
        edges.shuffle(rng);

        let target = grid.len() - 1;
        let mut unions = 0;
        for edge in edges {
            if unions == target {
                break;
            }
            let Some(to) = grid.neighbor(edge.from, edge.direction) else {
                continue;
            };
            // If cells are not yet connected, remove the wall between them
            if uf.unite(grid.ravel_index(edge.from), grid.ravel_index(to)) {
                grid.open_wall(edge.from, edge.direction);
                unions += 1;
            }
        }
        tracing::trace!("[kruskal] {} unions, {} sets left", unions, uf.sets());
    }
}
