//! Insurgency Stats
//!
//! Batch processor for Insurgency co-op server logs. Log files are folded
//! into per-match and per-player statistics, persisted to SQLite, and a
//! medal rule engine awards leaderboard and achievement medals after every
//! sweep.
//!
//! # Modules
//!
//! - `log_parser`: Turns raw log lines into typed events
//! - `aggregator`: Per-file match state machine (Match Aggregator)
//! - `store`: Persistence gateway traits and the SQLite implementation
//! - `medals`: Medal Rule Engine and the default medal catalogue
//! - `sweep`: File discovery, markers, and the periodic sweep loop
//! - `config`: Defaults, `.env` and environment resolution
//! - `logging`: `tracing` subscriber setup
//! - `types`: Core data structures (events, matches, medals)
//! - `utils`: Time normalization and Steam ID conversion
//!
//! # Example
//!
//! ```no_run
//! use insurgency_stats::{Config, SqliteStore, Sweeper};
//! use insurgency_stats::utils::current_timestamp;
//!
//! fn main() -> insurgency_stats::StatsResult<()> {
//!     let config = Config::new("/srv/insurgency/logs", "stats.db");
//!     let store = SqliteStore::open(&config.database_path)?;
//!     let report = Sweeper::new(&config).run_once(&store, current_timestamp())?;
//!     println!("{} matches persisted", report.matches_persisted);
//!     Ok(())
//! }
//! ```

pub mod aggregator;
pub mod config;
pub mod error;
pub mod log_parser;
pub mod logging;
pub mod medals;
pub mod store;
pub mod sweep;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use aggregator::{aggregate_file, AggregationOutcome, FileAggregation, MatchAggregator};
pub use config::Config;
pub use error::{ParseError, StatsError, StatsResult};
pub use medals::{MedalEngine, MedalRule, MedalSweepStats, RuleOutcome};
pub use store::{MatchStore, MedalStore, SqliteStore};
pub use sweep::{pending_files, SweepReport, Sweeper};
pub use types::{
    AggregatedMatch, LogEvent, MatchRecord, MedalKind, MedalRecord, PlayerMatchStats, UserAggregate,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
