//! Runtime configuration
//!
//! Values are resolved from, lowest precedence first: built-in defaults,
//! a `.env` file in the working directory, the process environment. The
//! binary applies its command line flags on top.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{StatsError, StatsResult};
use crate::logging::LoggingConfig;
use crate::utils::{TimeNormalizer, DEFAULT_TZ_OFFSET_SECS};

pub const DOTENV_FILE: &str = ".env";

pub const ENV_LOGS_DIR: &str = "STATS_LOGS_DIR";
pub const ENV_DB_PATH: &str = "STATS_DB_PATH";
pub const ENV_TZ_OFFSET: &str = "STATS_TZ_OFFSET_SECS";
pub const ENV_SWEEP_INTERVAL: &str = "STATS_SWEEP_INTERVAL_SECS";
pub const ENV_LOG_DIR: &str = "STATS_LOG_DIR";

pub const DEFAULT_DB_PATH: &str = "insurgency-stats.db";
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_MARKER_EXTENSION: &str = "parsed";

/// Configuration for the sweep driver and its store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Directory tree scanned for `*.log` files
    #[serde(rename = "logsDir")]
    pub logs_dir: PathBuf,
    #[serde(rename = "databasePath")]
    pub database_path: PathBuf,
    /// Seconds subtracted from raw log timestamps
    #[serde(rename = "tzOffsetSecs")]
    pub tz_offset_secs: i64,
    #[serde(rename = "sweepIntervalSecs")]
    pub sweep_interval_secs: u64,
    /// Directory for rolling diagnostic logs (stdout only when unset)
    #[serde(rename = "logDir")]
    pub log_dir: Option<PathBuf>,
    /// Extension appended to a fully processed file's name
    #[serde(rename = "markerExtension")]
    pub marker_extension: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logs_dir: PathBuf::from("."),
            database_path: PathBuf::from(DEFAULT_DB_PATH),
            tz_offset_secs: DEFAULT_TZ_OFFSET_SECS,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
            log_dir: None,
            marker_extension: DEFAULT_MARKER_EXTENSION.to_string(),
        }
    }
}

impl Config {
    /// Create a config with custom logs and database locations
    pub fn new(logs_dir: impl Into<PathBuf>, database_path: impl Into<PathBuf>) -> Self {
        Self {
            logs_dir: logs_dir.into(),
            database_path: database_path.into(),
            ..Default::default()
        }
    }

    /// Resolve from `.env` and the process environment
    pub fn load() -> StatsResult<Self> {
        let dotenv = load_dotenv(Path::new(DOTENV_FILE));
        Self::from_lookup(|key| {
            std::env::var(key)
                .ok()
                .filter(|value| !value.trim().is_empty())
                .or_else(|| dotenv.get(key).cloned())
        })
    }

    /// Resolve using an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> StatsResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup(ENV_LOGS_DIR) {
            config.logs_dir = PathBuf::from(dir);
        }
        if let Some(path) = lookup(ENV_DB_PATH) {
            config.database_path = PathBuf::from(path);
        }
        if let Some(raw) = lookup(ENV_TZ_OFFSET) {
            config.tz_offset_secs = parse_number(ENV_TZ_OFFSET, &raw)?;
        }
        if let Some(raw) = lookup(ENV_SWEEP_INTERVAL) {
            config.sweep_interval_secs = parse_number(ENV_SWEEP_INTERVAL, &raw)?;
        }
        if let Some(dir) = lookup(ENV_LOG_DIR) {
            config.log_dir = Some(PathBuf::from(dir));
        }

        config.validate()?;
        Ok(config)
    }

    /// Check invariants the sweep driver relies on
    pub fn validate(&self) -> StatsResult<()> {
        if self.sweep_interval_secs == 0 {
            return Err(StatsError::Config("sweep interval must be at least one second".into()));
        }
        if self.marker_extension.is_empty() || self.marker_extension.contains(&['.', '/', '\\'][..]) {
            return Err(StatsError::Config(format!(
                "invalid marker extension '{}'",
                self.marker_extension
            )));
        }
        Ok(())
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn normalizer(&self) -> TimeNormalizer {
        TimeNormalizer::new(self.tz_offset_secs)
    }

    pub fn logging(&self) -> LoggingConfig {
        LoggingConfig {
            log_dir: self.log_dir.clone(),
            ..Default::default()
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> StatsResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| StatsError::Config(format!("{key} must be an integer, got '{raw}'")))
}

/// Read `KEY=VALUE` pairs from a dotenv file; a missing file yields no pairs
pub fn load_dotenv(path: &Path) -> HashMap<String, String> {
    if !path.is_file() {
        return HashMap::new();
    }
    match fs::read_to_string(path) {
        Ok(text) => parse_dotenv(&text),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring unreadable dotenv file");
            HashMap::new()
        }
    }
}

/// Parse dotenv text: `#` comments, optional `export ` prefix, optional quotes
pub fn parse_dotenv(text: &str) -> HashMap<String, String> {
    let mut out = HashMap::new();
    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        let value = value.trim().trim_matches('"').trim_matches('\'').to_owned();
        out.insert(key.to_owned(), value);
    }
    out
}
