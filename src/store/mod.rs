//! Persistence Gateway
//!
//! The aggregator and the medal engine only talk to storage through the
//! [`MatchStore`] and [`MedalStore`] traits. [`SqliteStore`] implements both.
//!
//! # Architecture
//!
//! ```text
//! Aggregation sweep:
//! ┌────────────────┐    ┌──────────────────┐    ┌────────────────────────┐
//! │ AggregatedMatch│───►│ upsert matches   │───►│ upsert match_user_stats│
//! └────────────────┘    │ (ip,started,map) │    │ + recompute users row  │
//!                       └──────────────────┘    └────────────────────────┘
//!
//! Medal sweep:
//! ┌──────────┐    ┌────────────────────┐    ┌─────────────────────┐
//! │ MedalRule│───►│ users / match stats│───►│ user_medals writes  │
//! └──────────┘    │ (read only)        │    │ (single transaction)│
//!                 └────────────────────┘    └─────────────────────┘
//! ```

pub mod schema;
mod sqlite;

use serde::{Deserialize, Serialize};

use crate::error::StatsResult;
use crate::types::{AggregatedMatch, MedalKind, MedalRecord, MetricValue};

pub use sqlite::{SqliteStore, StoredPlayerStats};

/// Metric ranked by a leaderboard medal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardMetric {
    /// Cumulative kills
    Kills,
    /// Kill/death ratio in hundredths
    KdHundredths,
}

/// Per-user aggregate compared against a threshold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdMetric {
    /// Matches won
    MatchesWon,
    /// Longest run of consecutive won matches
    LongestWinStreak,
    /// Matches in which the user had the most kills
    TopFragMatches,
    /// Matches in which the user's K/D beat the match average
    AboveAverageKdMatches,
    /// Cumulative kills with any of the listed weapons
    WeaponKills(Vec<String>),
    /// Matches won as the only human player
    SoloWins,
    /// Matches won without dying
    FlawlessWins,
    /// Whole days between the user's first match and the sweep time
    DaysSinceFirstMatch,
}

/// One threshold evaluation: users lacking `kind` whose `metric >= threshold`
#[derive(Debug, Clone, Copy)]
pub struct ThresholdQuery<'a> {
    pub metric: &'a ThresholdMetric,
    pub threshold: i64,
    pub kind: MedalKind,
    /// Sweep time (canonical epoch seconds)
    pub as_of: i64,
}

/// Write side used by the aggregation sweep
pub trait MatchStore {
    /// Idempotently upsert one match and its player stats.
    ///
    /// Returns the stored match id.
    fn persist_match(&self, aggregated: &AggregatedMatch) -> StatsResult<i64>;
}

/// Read/write side used by the medal engine
pub trait MedalStore {
    /// Highest-ranked user for a leaderboard metric, if any
    fn top_user(&self, metric: LeaderboardMetric) -> StatsResult<Option<MetricValue>>;

    /// Current holder of a leaderboard medal
    fn current_holder(&self, kind: MedalKind) -> StatsResult<Option<MedalRecord>>;

    /// Make `holder` the current holder (insert or reactivate)
    fn award_holder(&self, kind: MedalKind, holder: MetricValue) -> StatsResult<()>;

    /// Update the value stored for the current holder
    fn update_holder_value(&self, kind: MedalKind, holder: MetricValue) -> StatsResult<()>;

    /// Demote `previous` and promote `next` atomically
    fn transfer_holder(&self, kind: MedalKind, previous: i64, next: MetricValue) -> StatsResult<()>;

    /// Users eligible for a threshold medal they do not hold yet
    fn threshold_candidates(&self, query: &ThresholdQuery<'_>) -> StatsResult<Vec<MetricValue>>;

    /// Insert a one-shot medal. Returns `false` if the user already had it.
    fn grant_medal(&self, kind: MedalKind, grant: MetricValue) -> StatsResult<bool>;
}
