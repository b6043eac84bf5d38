use std::io;
use std::time::Instant;

use clap::{Parser, ValueEnum};
use pagesim::config::{Config, LoggingConfig, SweepConfig};
use pagesim::input::prompt_sweep_config;
use pagesim::logging;
use pagesim::report::render_table;
use pagesim::sweep::{History, Sweep};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Parser, Debug)]
#[command(about = String::from("Compares FIFO, LRU, MRU and optimal page replacement over every page size"))]
struct Args {
    /// Size of the RAM, in the same units as the process size
    ram_size: Option<usize>,
    /// Number of processes simulated per page size
    process_count: Option<usize>,
    /// Size of each process
    process_size: Option<usize>,

    /// Read the sweep from a JSON configuration file instead
    #[arg(short, long, conflicts_with_all = ["ram_size", "process_count", "process_size"])]
    config: Option<String>,

    #[arg(short, long)]
    seed: Option<u64>,

    /// Threads the processes of each page size are split over
    #[arg(short, long)]
    workers: Option<usize>,

    #[arg(long)]
    references_per_page: Option<usize>,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Tracing filter, e.g. info or pagesim=debug. RUST_LOG takes precedence
    #[arg(long)]
    log_level: Option<String>,

    #[arg(short, long)]
    performance: bool,
}

fn main() -> Result<(), String> {
    let start = Instant::now();
    let args = Args::parse();

    let (mut sweep_config, mut logging_config) = match (&args.config, args.ram_size, args.process_count, args.process_size) {
        (Some(path), ..) => {
            let config = Config::from_file(path).map_err(|e| format!("Couldn't load the config file at path {path}: {e}"))?;
            (config.sweep, config.logging)
        }
        (None, Some(ram_size), Some(process_count), Some(process_size)) => {
            (SweepConfig::new(ram_size, process_count, process_size), LoggingConfig::default())
        }
        (None, None, None, None) => {
            let config = prompt_sweep_config(io::stdin().lock(), io::stdout())
                .map_err(|e| format!("Couldn't read the sweep parameters: {e}"))?;
            (config, LoggingConfig::default())
        }
        _ => return Err("Give all of the RAM size, process count and process size, or none of them".to_string()),
    };
    if let Some(seed) = args.seed {
        sweep_config = sweep_config.with_seed(seed);
    }
    if let Some(workers) = args.workers {
        sweep_config = sweep_config.with_workers(workers);
    }
    if let Some(references_per_page) = args.references_per_page {
        sweep_config = sweep_config.with_references_per_page(references_per_page);
    }
    if let Some(level) = args.log_level {
        logging_config.level = level;
    }
    logging::init(&logging_config);

    let mut history = History::new();
    let mut sweep = Sweep::new(sweep_config).map_err(|e| format!("Invalid sweep: {e}"))?;
    let report = sweep
        .run_into(&mut history)
        .map_err(|e| format!("The sweep failed: {e}"))?;
    match args.format {
        OutputFormat::Table => {
            println!("Results:");
            print!("{}", render_table(report));
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report).map_err(|e| format!("Couldn't serialise the output {e}"))?);
        }
    }
    if args.performance {
        let simulation_time = sweep.get_execution_time();
        let total_time = start.elapsed();
        println!("Seed: {}", sweep.seed());
        println!("Simulation time: {}s", simulation_time.as_nanos() as f64 / 1e9);
        println!("Total execution time (includes input, configuration, and output): {}s", total_time.as_nanos() as f64 / 1e9)
    }
    Ok(())
}
