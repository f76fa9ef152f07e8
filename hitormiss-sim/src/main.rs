use clap::Parser;
use hitormiss::{AccumulatorSink, LogSink, MemoryStore, Simulation};
use hitormiss_sim::report;
use hitormiss_sim::settings::{Overrides, SimConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Cache hit/miss simulator CLI
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON configuration file
    #[arg(short, long, value_name = "PATH", default_value = "config/config.json")]
    config: PathBuf,

    /// Bucket key prefix, overrides the file
    #[arg(long)]
    prefix: Option<String>,

    /// Number of buckets to seed, overrides the file
    #[arg(short, long)]
    buckets: Option<usize>,

    /// Seed for the key draws, for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Number of store segments
    #[arg(long)]
    segments: Option<usize>,

    /// Log level: trace, debug, info, warn, error
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    /// Export results to CSV file
    #[arg(long, value_name = "PATH")]
    output_csv: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Simulation failed");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let overrides = Overrides {
        prefix: args.prefix.clone(),
        buckets: args.buckets,
    };
    let config = SimConfig::resolve(&args.config, &overrides)?
        .ok_or_else(|| {
            format!(
                "config file {} not found; pass both --prefix and --buckets to run without one",
                args.config.display()
            )
        })?
        .application;

    info!(
        prefix = %config.bucket_key_prefix,
        buckets = config.initial_number_of_buckets,
        "Starting simulation"
    );

    let store = Arc::new(match args.segments {
        Some(segments) => MemoryStore::with_segments(segments),
        None => MemoryStore::new(),
    });
    let accumulators = AccumulatorSink::new(Arc::clone(&store), config.hits_key(), config.misses_key());

    let mut simulation = Simulation::new(store, config.clone())?
        .with_sink(LogSink)
        .with_sink(accumulators);
    if let Some(seed) = args.seed {
        simulation = simulation.with_seed(seed);
    }
    let run_report = simulation.run()?;

    report::print_summary(&config, &run_report);

    if let Some(path) = &args.output_csv {
        report::export_csv(path, &config, &run_report)?;
        info!(path = %path.display(), "Results exported");
    }

    Ok(())
}

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
}
