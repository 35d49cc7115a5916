//! Command-line batch run: paired stock and bond quote directories in,
//! implied volatility CSV out.
//!
//! ```text
//! cb_implied_vol --stock-dir data/2727/ --bond-dir data/27271/ --output 27271_IV.csv
//! ```

use cb_implied_vol::prelude::{IvSummary, Pipeline, PipelineError, RunConfig};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process;
use tracing::{Level, error, info};

/// Implied volatility of a convertible bond's conversion option
#[derive(Parser)]
#[command(name = "cb_implied_vol", version)]
struct Cli {
    /// Directory of daily stock quote files
    #[arg(long)]
    stock_dir: PathBuf,

    /// Directory of daily convertible bond quote files
    #[arg(long)]
    bond_dir: PathBuf,

    /// JSON run configuration; absent fields take the built-in defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output CSV path
    #[arg(long, default_value = "27271_IV.csv")]
    output: PathBuf,

    /// Worker threads for the implied volatility solve
    #[arg(long)]
    workers: Option<usize>,

    /// Log verbosity
    #[arg(long, value_enum, default_value = "info")]
    log_level: LogLevel,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

fn load_config(cli: &Cli) -> Result<RunConfig, PipelineError> {
    let mut config = match &cli.config {
        Some(path) => RunConfig::from_file(path)?,
        None => RunConfig::default(),
    };
    if let Some(workers) = cli.workers {
        config.workers = workers;
    }
    Ok(config)
}

fn run(cli: &Cli) -> Result<(), PipelineError> {
    let config = load_config(cli)?;
    if cli.print_config {
        println!("{}", config.to_json()?);
        return Ok(());
    }

    let pipeline = Pipeline::new(config)?;
    let records = pipeline.run(&cli.stock_dir, &cli.bond_dir)?;
    pipeline.write_output(&cli.output, &records)?;

    let summary = IvSummary::from_records(&records);
    let report = serde_json::json!({
        "output": cli.output.display().to_string(),
        "rows": summary.rows,
        "resolved": summary.resolved,
        "unresolved": summary.unresolved,
    });
    println!("{report}");
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(Level::from(cli.log_level))
        .init();

    info!("Starting implied volatility run");
    if let Err(err) = run(&cli) {
        error!("{}", err);
        eprintln!("Error: {err}");
        process::exit(1);
    }
}
