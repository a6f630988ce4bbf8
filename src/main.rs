//! Insurgency Stats - Binary Entry Point

use std::path::PathBuf;
use std::sync::mpsc;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use insurgency_stats::aggregator::aggregate_file;
use insurgency_stats::logging;
use insurgency_stats::utils::current_timestamp;
use insurgency_stats::{Config, MedalEngine, SqliteStore, StatsResult, Sweeper, NAME, VERSION};

#[derive(Parser)]
#[command(author, version, about = "Insurgency server log statistics and medals")]
struct Cli {
    /// Directory scanned recursively for *.log files
    #[arg(long, global = true)]
    logs_dir: Option<PathBuf>,

    /// SQLite database file
    #[arg(long = "db", global = true)]
    database: Option<PathBuf>,

    /// Seconds subtracted from raw log timestamps
    #[arg(long, global = true, allow_hyphen_values = true)]
    tz_offset: Option<i64>,

    /// Seconds between sweeps in `run` mode
    #[arg(long, global = true)]
    interval: Option<u64>,

    /// Directory for rolling diagnostic log files
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sweep periodically until interrupted (default)
    Run,
    /// Run a single sweep and exit
    Sweep,
    /// Run the medal engine only
    Medals,
    /// Aggregate one log file without persisting and print the result
    Inspect {
        /// Log file to aggregate
        file: PathBuf,
    },
}

impl Cli {
    /// Apply command line flags on top of the environment
    fn resolve_config(&self) -> StatsResult<Config> {
        let mut config = Config::load()?;
        if let Some(dir) = &self.logs_dir {
            config.logs_dir = dir.clone();
        }
        if let Some(path) = &self.database {
            config.database_path = path.clone();
        }
        if let Some(offset) = self.tz_offset {
            config.tz_offset_secs = offset;
        }
        if let Some(interval) = self.interval {
            config.sweep_interval_secs = interval;
        }
        if let Some(dir) = &self.log_dir {
            config.log_dir = Some(dir.clone());
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> StatsResult<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;
    logging::init(&config.logging())?;

    let result = run(cli.command.unwrap_or(Commands::Run), &config);
    if let Err(e) = &result {
        error!(error = %e, "fatal error");
    }
    result
}

fn run(command: Commands, config: &Config) -> StatsResult<()> {
    match command {
        Commands::Run => {
            info!(name = NAME, version = VERSION, db = %config.database_path.display(), "starting");
            let store = SqliteStore::open(&config.database_path)?;

            let (shutdown_tx, shutdown_rx) = mpsc::channel();
            ctrlc::set_handler(move || {
                let _ = shutdown_tx.send(());
            })?;

            Sweeper::new(config).run_loop(&store, &shutdown_rx)
        }
        Commands::Sweep => {
            let store = SqliteStore::open(&config.database_path)?;
            let report = Sweeper::new(config).run_once(&store, current_timestamp())?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Commands::Medals => {
            let store = SqliteStore::open(&config.database_path)?;
            let stats = MedalEngine::new().run(&store, current_timestamp())?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
            Ok(())
        }
        Commands::Inspect { file } => {
            let aggregation = aggregate_file(&file, config.normalizer())?;
            println!("{}", serde_json::to_string_pretty(&aggregation)?);
            Ok(())
        }
    }
}
