use std::time::Instant;

use rand::Rng;

use crate::config::Config;
use crate::error::ConfigError;
use crate::generators::Carver;
use crate::loops::LoopInjector;
use crate::maze::Grid;

/// Builds a maze from `config`, seeding the random source from `config.seed`.
pub fn generate(config: &Config) -> crate::Result<Grid> {
    let mut rng = config.rng();
    Ok(generate_with_rng(config, &mut rng)?)
}

/// Validates `config`, carves a fresh grid with the selected algorithm and injects loops
/// when a loop chance is set. Nothing is built when validation fails.
pub fn generate_with_rng<R: Rng + ?Sized>(config: &Config, rng: &mut R) -> Result<Grid, ConfigError> {
    config.validate()?;

    let start = Instant::now();
    let carver = Carver::from_config(config);
    let grid = carver.generate(Grid::new(config.width, config.height), rng);
    tracing::info!(
        "[{}] carved {}x{} in {:?}",
        carver.algorithm(),
        config.width,
        config.height,
        start.elapsed()
    );

    let grid = match config.loop_chance {
        Some(chance) => LoopInjector::new(chance).apply(grid, rng),
        None => grid,
    };
    tracing::debug!(
        "[pipeline] done in {:?}, {} edges, perfect: {}",
        start.elapsed(),
        grid.edge_count(),
        grid.is_perfect()
    );
    Ok(grid)
}
