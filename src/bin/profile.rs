use std::time::{Duration, Instant};

use mazegen::{Algorithm, Config, generate};

fn main() -> mazegen::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args();
    args.next(); // Skip executable name
    let size = args
        .next()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(1000);
    let num_iters = args
        .next()
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(1)
        .max(1);

    for algorithm in Algorithm::ALL {
        let mut total = Duration::ZERO;
        for seed in 0..num_iters as u64 {
            let config = Config::new(size, size, algorithm).with_seed(Some(seed));
            let start = Instant::now();
            let grid = generate(&config)?;
            total += start.elapsed();
            assert!(grid.is_perfect(), "{} produced a broken maze", algorithm);
        }
        println!(
            "{:<32} {}x{}: {:?} per maze",
            algorithm.to_string(),
            size,
            size,
            total / num_iters
        );
    }
    Ok(())
}
