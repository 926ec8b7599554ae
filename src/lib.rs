//! Maze layout generation.
//!
//! A [`Grid`](maze::Grid) of cells is carved into a perfect maze by one of several
//! spanning-tree algorithms, optionally given extra routes by the loop injector, and
//! exchanged with other tools as a flat list of cell records.

pub mod batch;
pub mod config;
pub mod error;
pub mod generators;
pub mod list;
pub mod loops;
pub mod maze;
pub mod pipeline;
pub mod render;
pub mod timelog;

pub use config::{Algorithm, Bias, Config, DirectionPair};
pub use error::{ConfigError, Error, FormatError, Result, SettingsError};
pub use maze::{Cell, Coord, Direction, Grid};
pub use pipeline::{generate, generate_with_rng};
