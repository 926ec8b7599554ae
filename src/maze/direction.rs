use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// One of the four cardinal directions. `N` points towards row 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    N,
    S,
    E,
    W,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::N, Direction::S, Direction::W, Direction::E];

    pub fn opposite(self) -> Direction {
        match self {
            Direction::N => Direction::S,
            Direction::S => Direction::N,
            Direction::E => Direction::W,
            Direction::W => Direction::E,
        }
    }

    /// Unit offset `(dx, dy)` of a step in this direction.
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::N => (0, -1),
            Direction::S => (0, 1),
            Direction::E => (1, 0),
            Direction::W => (-1, 0),
        }
    }

    /// Position of this direction in [`Direction::ALL`].
    pub fn index(self) -> usize {
        match self {
            Direction::N => 0,
            Direction::S => 1,
            Direction::W => 2,
            Direction::E => 3,
        }
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Direction::N | Direction::S)
    }

    /// The two directions at right angles to this one.
    pub fn perpendicular(self) -> [Direction; 2] {
        if self.is_vertical() {
            [Direction::W, Direction::E]
        } else {
            [Direction::N, Direction::S]
        }
    }

    fn bit(self) -> u8 {
        match self {
            Direction::N => 0b0001,
            Direction::S => 0b0010,
            Direction::E => 0b0100,
            Direction::W => 0b1000,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::N => "N",
            Direction::S => "S",
            Direction::E => "E",
            Direction::W => "W",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Direction {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "N" | "NORTH" => Ok(Direction::N),
            "S" | "SOUTH" => Ok(Direction::S),
            "E" | "EAST" => Ok(Direction::E),
            "W" | "WEST" => Ok(Direction::W),
            _ => Err(ConfigError::UnknownDirection(s.to_string())),
        }
    }
}

/// Set of open (wall-free) directions of a cell.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DirectionSet(u8);

impl DirectionSet {
    pub const EMPTY: DirectionSet = DirectionSet(0);

    pub fn contains(self, direction: Direction) -> bool {
        self.0 & direction.bit() != 0
    }

    pub fn insert(&mut self, direction: Direction) -> bool {
        let was_open = self.contains(direction);
        self.0 |= direction.bit();
        !was_open
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Directions in the fixed order N, S, W, E.
    pub fn iter(self) -> impl Iterator<Item = Direction> {
        Direction::ALL.into_iter().filter(move |&d| self.contains(d))
    }

    /// Exactly {N, S} or exactly {W, E}: a corridor cell with no side branches.
    pub fn is_straight(self) -> bool {
        self == DirectionSet::from_iter([Direction::N, Direction::S])
            || self == DirectionSet::from_iter([Direction::W, Direction::E])
    }
}

impl FromIterator<Direction> for DirectionSet {
    fn from_iter<I: IntoIterator<Item = Direction>>(iter: I) -> Self {
        let mut set = DirectionSet::EMPTY;
        iter.into_iter().for_each(|d| {
            set.insert(d);
        });
        set
    }
}
