use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;

use mazegen::batch::{BatchEntry, BatchStore};
use mazegen::config::MIN_DIMENSION;
use mazegen::list::{export, export_blocks};
use mazegen::render::{render, to_ascii};
use mazegen::timelog::{TimeLog, estimated_iterations, format_duration};
use mazegen::{Algorithm, Bias, Config, DirectionPair, generate_with_rng};

#[derive(Parser)]
#[command(name = "mazegen", author, version, about = "Generate maze layouts")]
struct Cli {
    /// Write logs to this file instead of stderr
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate one maze
    Generate(GenerateArgs),

    /// Manage and run stored maze settings
    Batch {
        /// Settings store file
        #[arg(long, default_value = "maze_setups.txt")]
        store: PathBuf,

        #[command(subcommand)]
        action: BatchCommand,
    },

    /// Estimate how long a maze of the given size takes to generate
    Estimate {
        width: u16,
        height: u16,

        /// Generation time log file
        #[arg(long, default_value = "estimate_time_log.txt")]
        time_log: PathBuf,
    },
}

/// Carving options shared by single and batch generation.
#[derive(Args)]
struct CarveArgs {
    /// BREADTH_FIRST, DEPTH_FIRST, PRIMS, KRUSKALS, ELLERS or BINARY_TREE
    #[arg(short, long, default_value = "DEPTH_FIRST")]
    algorithm: Algorithm,

    /// Favoured direction (N, S, E, W or none)
    #[arg(long, default_value = "none")]
    bias: String,

    /// How strongly the bias direction is favoured
    #[arg(long, default_value_t = 1)]
    bias_strength: u32,

    /// Binary tree directions (NE, NW, SE, SW)
    #[arg(long, default_value = "NE")]
    binary_dirs: DirectionPair,

    /// Let the binary tree carve through the edges so the maze tiles
    #[arg(long)]
    tileable: bool,

    /// Random seed for reproducible mazes
    #[arg(short, long)]
    seed: Option<u64>,
}

impl CarveArgs {
    fn config(&self, width: u16, height: u16) -> mazegen::Result<Config> {
        let direction = Bias::parse_direction(&self.bias)?;
        Ok(Config::new(width, height, self.algorithm)
            .with_bias(direction, self.bias_strength)
            .with_binary_tree(self.binary_dirs, self.tileable)
            .with_seed(self.seed))
    }
}

#[derive(Args)]
struct GenerateArgs {
    #[arg(short = 'W', long, default_value_t = 10)]
    width: u16,

    #[arg(short = 'H', long, default_value_t = 10)]
    height: u16,

    #[command(flatten)]
    carve: CarveArgs,

    /// Add loops: each straight corridor becomes a junction with a 1 in N chance
    #[arg(short, long, value_name = "N")]
    loops: Option<u32>,

    /// Write the maze here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value_t = Format::Blocks)]
    format: Format,

    /// Draw the maze in the terminal
    #[arg(short, long)]
    render: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// One record per cell and per wall; imports back to the same maze
    Blocks,
    /// One record per cell, without walls
    List,
    /// `#` and space text
    Ascii,
}

#[derive(Subcommand)]
enum BatchCommand {
    /// Append a maze setting
    Store(StoreArgs),
    /// List stored settings
    List,
    /// Show one stored setting
    Show { index: usize },
    /// Delete one stored setting
    Delete { index: usize },
    /// Delete all stored settings
    Clear,
    /// Generate a maze for every stored setting
    Run(RunArgs),
}

#[derive(Args)]
struct StoreArgs {
    #[arg(short = 'W', long, default_value_t = 10)]
    width: u16,

    #[arg(short = 'H', long, default_value_t = 10)]
    height: u16,

    /// Add loops with a 1 in N chance per corridor
    #[arg(short, long, value_name = "N")]
    loops: Option<u32>,

    /// Import this block layout instead of generating
    #[arg(long, value_name = "PATH")]
    list_maze: Option<String>,

    /// Write the result as a block layout
    #[arg(long)]
    write_list: bool,

    #[arg(long)]
    gen_3d: bool,

    #[arg(long)]
    islands: bool,
}

impl From<StoreArgs> for BatchEntry {
    fn from(args: StoreArgs) -> Self {
        let defaults = BatchEntry::default();
        BatchEntry {
            width: args.width,
            height: args.height,
            gen_3d: args.gen_3d,
            allow_loops: args.loops.is_some(),
            loop_chance: args.loops.unwrap_or(defaults.loop_chance),
            allow_islands: args.islands,
            use_list_maze: args.list_maze.is_some(),
            list_maze: args.list_maze.unwrap_or_default(),
            write_list_maze: args.write_list,
        }
    }
}

#[derive(Args)]
struct RunArgs {
    #[command(flatten)]
    carve: CarveArgs,

    /// Directory for written layouts
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Generation time log file
    #[arg(long, default_value = "estimate_time_log.txt")]
    time_log: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _guard = match init_tracing(cli.verbose, cli.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("cannot open log file: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Command::Generate(args) => run_generate(args),
        Command::Batch { store, action } => run_batch(&BatchStore::new(store), action),
        Command::Estimate {
            width,
            height,
            time_log,
        } => run_estimate(width, height, &time_log),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr, or through a background writer to `log_file`.
/// The returned guard flushes the file writer when dropped.
fn init_tracing(verbose: u8, log_file: Option<&Path>) -> io::Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let builder = tracing_subscriber::fmt().with_max_level(level);
    match log_file {
        Some(path) => {
            let (writer, guard) = tracing_appender::non_blocking(File::create(path)?);
            builder.with_writer(writer).with_ansi(false).init();
            Ok(Some(guard))
        }
        None => {
            builder.with_writer(io::stderr).init();
            Ok(None)
        }
    }
}

fn run_generate(args: GenerateArgs) -> mazegen::Result<()> {
    let config = args
        .carve
        .config(args.width, args.height)?
        .with_loops(args.loops);
    let mut rng = config.rng();
    let grid = generate_with_rng(&config, &mut rng)?;

    if args.render {
        render(&grid, &mut io::stdout().lock())?;
    }
    let text = match args.format {
        Format::List => export(&grid).to_text(),
        Format::Blocks => export_blocks(&grid)?.to_text(),
        Format::Ascii => to_ascii(&grid)?,
    };
    match args.output {
        Some(path) => {
            fs::write(&path, text)?;
            tracing::info!("[generate] wrote {}", path.display());
        }
        None if !args.render => io::stdout().lock().write_all(text.as_bytes())?,
        None => {}
    }
    Ok(())
}

fn run_batch(store: &BatchStore, action: BatchCommand) -> mazegen::Result<()> {
    match action {
        BatchCommand::Store(args) => {
            let index = store.store(&BatchEntry::from(args))?;
            println!("stored maze {index}");
        }
        BatchCommand::List => {
            let entries = store.load()?;
            if entries.is_empty() {
                println!("no stored mazes");
            }
            for (i, entry) in entries.iter().enumerate() {
                println!("{}: {}", i + 1, entry);
            }
        }
        BatchCommand::Show { index } => {
            let entry = store.get(index)?;
            println!("{}: {}", index, entry);
            println!("{}", entry.encode());
        }
        BatchCommand::Delete { index } => {
            let entry = store.delete(index)?;
            println!("deleted maze {index}: {entry}");
        }
        BatchCommand::Clear => store.clear()?,
        BatchCommand::Run(args) => run_stored(store, args)?,
    }
    Ok(())
}

/// Builds every stored maze in order. A bad entry is reported and skipped.
fn run_stored(store: &BatchStore, args: RunArgs) -> mazegen::Result<()> {
    // Dimensions come from each entry
    let base = args.carve.config(MIN_DIMENSION, MIN_DIMENSION)?;
    let report = store.run(&base, &args.out_dir, &args.time_log)?;
    for (index, error) in &report.skipped {
        println!("maze {index}: skipped, {error}");
    }
    for maze in &report.built {
        println!(
            "maze {}: {}x{} in {:.3}s",
            maze.index, maze.width, maze.height, maze.seconds
        );
    }
    println!(
        "built {} of {} mazes in {:.3}s",
        report.built.len(),
        report.built.len() + report.skipped.len(),
        report.seconds
    );
    Ok(())
}

fn run_estimate(width: u16, height: u16, time_log: &Path) -> mazegen::Result<()> {
    let log = TimeLog::load(time_log)?;
    let seconds = log.estimate(width as u64 * height as u64);
    println!(
        "Estimated iterations: {} loops",
        estimated_iterations(width, height)
    );
    println!("Estimated time: {}", format_duration(seconds));
    Ok(())
}
