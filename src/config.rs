use std::fmt;
use std::str::FromStr;

use rand::{SeedableRng, rngs::StdRng};

use crate::error::ConfigError;
use crate::maze::Direction;

/// Smallest accepted width and height.
pub const MIN_DIMENSION: u16 = 2;

/// Maze carving algorithm selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    BreadthFirst,
    DepthFirst,
    Prims,
    Kruskals,
    Ellers,
    BinaryTree,
}

impl Algorithm {
    pub const ALL: [Algorithm; 6] = [
        Algorithm::BreadthFirst,
        Algorithm::DepthFirst,
        Algorithm::Prims,
        Algorithm::Kruskals,
        Algorithm::Ellers,
        Algorithm::BinaryTree,
    ];

    /// Selector string used by the settings layer.
    pub fn selector(self) -> &'static str {
        match self {
            Algorithm::BreadthFirst => "BREADTH_FIRST",
            Algorithm::DepthFirst => "DEPTH_FIRST",
            Algorithm::Prims => "PRIMS",
            Algorithm::Kruskals => "KRUSKALS",
            Algorithm::Ellers => "ELLERS",
            Algorithm::BinaryTree => "BINARY_TREE",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::BreadthFirst => write!(f, "Randomized Breadth-First Search"),
            Algorithm::DepthFirst => write!(f, "Randomized Depth-First Search"),
            Algorithm::Prims => write!(f, "Prim's Algorithm"),
            Algorithm::Kruskals => write!(f, "Kruskal's Algorithm"),
            Algorithm::Ellers => write!(f, "Eller's Algorithm"),
            Algorithm::BinaryTree => write!(f, "Binary Tree"),
        }
    }
}

impl FromStr for Algorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        Algorithm::ALL
            .into_iter()
            .find(|a| a.selector() == normalized)
            .ok_or_else(|| ConfigError::UnknownAlgorithm(s.to_string()))
    }
}

/// Skews random direction choices towards one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bias {
    /// `None` means uniform choice.
    pub direction: Option<Direction>,
    /// Weight multiplier for `direction`. 1 is unbiased.
    pub strength: u32,
}

impl Default for Bias {
    fn default() -> Self {
        Bias {
            direction: None,
            strength: 1,
        }
    }
}

impl Bias {
    pub fn new(direction: Option<Direction>, strength: u32) -> Self {
        Bias {
            direction,
            strength,
        }
    }

    /// Parses a bias direction where `none` (or an empty string) disables the bias.
    pub fn parse_direction(s: &str) -> Result<Option<Direction>, ConfigError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(None),
            _ => s.parse().map(Some),
        }
    }
}

/// The two directions a binary tree may carve in: one vertical, one horizontal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectionPair {
    vertical: Direction,
    horizontal: Direction,
}

impl DirectionPair {
    pub fn new(a: Direction, b: Direction) -> Result<Self, ConfigError> {
        match (a.is_vertical(), b.is_vertical()) {
            (true, false) => Ok(DirectionPair {
                vertical: a,
                horizontal: b,
            }),
            (false, true) => Ok(DirectionPair {
                vertical: b,
                horizontal: a,
            }),
            _ => Err(ConfigError::DirectionPair(format!("{}{}", a, b))),
        }
    }

    pub fn vertical(&self) -> Direction {
        self.vertical
    }

    pub fn horizontal(&self) -> Direction {
        self.horizontal
    }

    pub fn directions(&self) -> [Direction; 2] {
        [self.vertical, self.horizontal]
    }
}

impl Default for DirectionPair {
    fn default() -> Self {
        DirectionPair {
            vertical: Direction::N,
            horizontal: Direction::E,
        }
    }
}

impl fmt::Display for DirectionPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.vertical, self.horizontal)
    }
}

impl FromStr for DirectionPair {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ConfigError::DirectionPair(s.to_string());
        let letters = s.trim().chars().collect::<Vec<_>>();
        if letters.len() != 2 {
            return Err(malformed());
        }
        let a = letters[0].to_string().parse().map_err(|_| malformed())?;
        let b = letters[1].to_string().parse().map_err(|_| malformed())?;
        DirectionPair::new(a, b).map_err(|_| malformed())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BinaryTreeOptions {
    pub directions: DirectionPair,
    /// Carve through the grid edges so the layout tiles seamlessly.
    pub tileable: bool,
}

/// Parameters for one generation run. Immutable once validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub width: u16,
    pub height: u16,
    pub algorithm: Algorithm,
    pub bias: Bias,
    /// 1-in-N chance for each straight corridor cell to become a junction.
    /// `None` disables loop injection.
    pub loop_chance: Option<u32>,
    pub binary_tree: BinaryTreeOptions,
    /// Seed for reproducible runs. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Config {
    pub fn new(width: u16, height: u16, algorithm: Algorithm) -> Self {
        Config {
            width,
            height,
            algorithm,
            bias: Bias::default(),
            loop_chance: None,
            binary_tree: BinaryTreeOptions::default(),
            seed: None,
        }
    }

    pub fn with_bias(mut self, direction: Option<Direction>, strength: u32) -> Self {
        self.bias = Bias::new(direction, strength);
        self
    }

    pub fn with_loops(mut self, loop_chance: Option<u32>) -> Self {
        self.loop_chance = loop_chance;
        self
    }

    pub fn with_binary_tree(mut self, directions: DirectionPair, tileable: bool) -> Self {
        self.binary_tree = BinaryTreeOptions {
            directions,
            tileable,
        };
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width < MIN_DIMENSION || self.height < MIN_DIMENSION {
            return Err(ConfigError::Dimensions {
                width: self.width,
                height: self.height,
            });
        }
        if self.bias.strength < 1 {
            return Err(ConfigError::BiasStrength(self.bias.strength));
        }
        match self.loop_chance {
            Some(chance) if chance < 1 => Err(ConfigError::LoopChance(chance)),
            _ => Ok(()),
        }
    }

    /// Random source for this run, seeded for reproducibility when `seed` is set.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_os_rng(),
        }
    }
}
