//! Sweep driver
//!
//! One sweep discovers unprocessed log files, aggregates them in parallel,
//! persists every emitted match in file order, marks finished files, and
//! then runs the medal engine. Marked files are never read again.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::aggregator::{aggregate_file, FileAggregation};
use crate::config::Config;
use crate::error::StatsResult;
use crate::medals::{MedalEngine, MedalSweepStats};
use crate::store::{MatchStore, MedalStore};
use crate::utils::{current_timestamp, TimeNormalizer};

const LOG_EXTENSION: &str = "log";

/// Summary of one sweep
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    #[serde(rename = "filesSeen")]
    pub files_seen: usize,
    #[serde(rename = "filesMarked")]
    pub files_marked: usize,
    #[serde(rename = "filesSkipped")]
    pub files_skipped: usize,
    #[serde(rename = "matchesPersisted")]
    pub matches_persisted: usize,
    #[serde(rename = "parseFailures")]
    pub parse_failures: usize,
    pub medals: MedalSweepStats,
}

/// Companion marker path: `<file>.<marker_ext>`
pub fn marker_path(path: &Path, marker_ext: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(marker_ext);
    PathBuf::from(name)
}

/// All `*.log` files below `root` without a marker, sorted by path
pub fn pending_files(root: &Path, marker_ext: &str) -> StatsResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    collect_pending(root, marker_ext, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_pending(dir: &Path, marker_ext: &str, out: &mut Vec<PathBuf>) -> StatsResult<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            collect_pending(&path, marker_ext, out)?;
        } else if path.extension().is_some_and(|ext| ext == LOG_EXTENSION)
            && !marker_path(&path, marker_ext).exists()
        {
            out.push(path);
        }
    }
    Ok(())
}

/// Drives aggregation and medal sweeps over a logs directory
pub struct Sweeper {
    logs_dir: PathBuf,
    marker_extension: String,
    normalizer: TimeNormalizer,
    interval: Duration,
    engine: MedalEngine,
}

impl Sweeper {
    /// Create a sweeper with the full medal catalogue
    pub fn new(config: &Config) -> Self {
        Self {
            logs_dir: config.logs_dir.clone(),
            marker_extension: config.marker_extension.clone(),
            normalizer: config.normalizer(),
            interval: config.sweep_interval(),
            engine: MedalEngine::new(),
        }
    }

    /// Run one aggregation sweep followed by one medal sweep.
    ///
    /// Per-file problems skip that file and leave it unmarked; store
    /// failures abort the sweep.
    pub fn run_once<S>(&self, store: &S, as_of: i64) -> StatsResult<SweepReport>
    where
        S: MatchStore + MedalStore,
    {
        let files = pending_files(&self.logs_dir, &self.marker_extension)?;
        let mut report = SweepReport {
            files_seen: files.len(),
            ..Default::default()
        };

        // Parsing is independent per file; persistence stays sequential.
        let normalizer = self.normalizer;
        let aggregations: Vec<(PathBuf, StatsResult<FileAggregation>)> = files
            .into_par_iter()
            .map(|path| {
                let result = aggregate_file(&path, normalizer);
                (path, result)
            })
            .collect();

        for (path, result) in aggregations {
            let aggregation = match result {
                Ok(aggregation) => aggregation,
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "skipping log file");
                    report.files_skipped += 1;
                    continue;
                }
            };
            report.parse_failures += aggregation.outcome.stats.parse_failures;

            match self.persist_file(store, &aggregation) {
                Ok(persisted) => report.matches_persisted += persisted,
                Err(e) if e.is_file_scoped() => {
                    warn!(file = %path.display(), error = %e, "skipping log file");
                    report.files_skipped += 1;
                    continue;
                }
                Err(e) => return Err(e),
            }

            if aggregation.outcome.is_markable() {
                fs::write(marker_path(&path, &self.marker_extension), b"")?;
                report.files_marked += 1;
                debug!(file = %path.display(), "marked log file");
            } else {
                debug!(
                    file = %path.display(),
                    matches = aggregation.outcome.matches.len(),
                    "log file left pending"
                );
            }
        }

        report.medals = self.engine.run(store, as_of)?;

        info!(
            files = report.files_seen,
            marked = report.files_marked,
            skipped = report.files_skipped,
            matches = report.matches_persisted,
            parse_failures = report.parse_failures,
            medals_granted = report.medals.medals_granted,
            holders_changed = report.medals.holders_transferred,
            "sweep complete"
        );
        Ok(report)
    }

    fn persist_file<S: MatchStore>(&self, store: &S, aggregation: &FileAggregation) -> StatsResult<usize> {
        for aggregated in &aggregation.outcome.matches {
            let match_id = store.persist_match(aggregated)?;
            debug!(
                match_id,
                ip = %aggregated.record.ip,
                map = %aggregated.record.map,
                players = aggregated.player_count(),
                "persisted match"
            );
        }
        Ok(aggregation.outcome.matches.len())
    }

    /// Sweep every `interval` until `shutdown` receives a message or its
    /// sender is dropped. Sweep errors end the loop.
    pub fn run_loop<S>(&self, store: &S, shutdown: &Receiver<()>) -> StatsResult<()>
    where
        S: MatchStore + MedalStore,
    {
        info!(
            logs_dir = %self.logs_dir.display(),
            interval_secs = self.interval.as_secs(),
            "starting sweep loop"
        );

        loop {
            self.run_once(store, current_timestamp())?;

            match shutdown.recv_timeout(self.interval) {
                Err(RecvTimeoutError::Timeout) => continue,
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    info!("shutdown requested, stopping sweep loop");
                    return Ok(());
                }
            }
        }
    }
}
