use thiserror::Error;

use crate::maze::Coord;

/// Invalid generation parameters. Raised before any grid is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("maze dimensions must be at least 2x2, got {width}x{height}")]
    Dimensions { width: u16, height: u16 },

    #[error("unknown maze algorithm: {0:?}")]
    UnknownAlgorithm(String),

    #[error("unknown bias direction: {0:?}")]
    UnknownDirection(String),

    #[error("bias strength must be at least 1, got {0}")]
    BiasStrength(u32),

    #[error("loop chance must be at least 1, got {0}")]
    LoopChance(u32),

    #[error("binary tree needs one vertical and one horizontal direction (NE, NW, SE, SW), got {0:?}")]
    DirectionPair(String),
}

/// Rejected exchange-format input. `index` is the 0-based record position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("expected {expected} records for the declared dimensions, found {found}")]
    RecordCount { expected: usize, found: usize },

    #[error("record {index}: coordinate {coord:?} is outside a {width}x{height} grid")]
    OutOfBounds {
        index: usize,
        coord: Coord,
        width: u16,
        height: u16,
    },

    #[error("record {index}: coordinate {coord:?} appears more than once")]
    Duplicate { index: usize, coord: Coord },

    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("list maze is empty")]
    Empty,

    #[error("a {width}x{height} maze is too large for the block layout")]
    TooLarge { width: u16, height: u16 },
}

/// Errors from the flat-file settings stores (batch entries, time log).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("malformed {kind} record {index}: {reason}")]
    Malformed {
        kind: &'static str,
        index: usize,
        reason: String,
    },

    #[error("no stored mazes")]
    Empty,

    #[error("no stored maze with index {index} (have {count})")]
    NoSuchEntry { index: usize, count: usize },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
