pub mod cell;
pub mod direction;
pub mod grid;

pub use cell::Cell;
pub use direction::{Direction, DirectionSet};
pub use grid::Grid;

/// Cell coordinate `(x, y)`, 0-based from the top-left corner.
pub type Coord = (u16, u16);
