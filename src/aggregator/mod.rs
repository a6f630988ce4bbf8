//! Match Aggregator
//!
//! Folds the ordered event stream of one log file into match records and
//! per-player statistics.
//!
//! # State machine
//!
//! ```text
//!            MapLoad               MapLoad (forced map change: close + reopen)
//!   ┌──────┐ ───────► ┌─────────┐ ◄──────┐
//!   │ Idle │          │ InMatch │ ───────┘
//!   └──────┘          └─────────┘
//!                          │ server_message "quit" / end of file
//!                          ▼
//!                     ┌──────────┐  MapLoad
//!                     │ Finished │ ────────► InMatch (new match instance)
//!                     └──────────┘
//! ```
//!
//! Duration is fixed by the first end trigger only (attacker round win,
//! level change, quit, or a forced map change). Matches that never saw a
//! map are discarded.

mod file;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::log_parser;
use crate::types::{AggregatedMatch, LogEvent, MatchRecord, Player, PlayerMatchStats, Team};
use crate::utils::{elapsed_secs, TimeNormalizer};

pub use file::{aggregate_file, extract_ip, FileAggregation};

/// Text of the server message that ends a match
pub const QUIT_MESSAGE: &str = "quit";

/// Aggregator lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchState {
    Idle,
    InMatch,
    Finished,
}

/// Counters collected while aggregating one file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationStats {
    #[serde(rename = "linesRead")]
    pub lines_read: usize,
    #[serde(rename = "eventsApplied")]
    pub events_applied: usize,
    #[serde(rename = "parseFailures")]
    pub parse_failures: usize,
    /// Human-vs-human and bot-vs-bot kills
    #[serde(rename = "killsIgnored")]
    pub kills_ignored: usize,
    /// Partial matches dropped because no map was ever loaded
    #[serde(rename = "matchesDiscarded")]
    pub matches_discarded: usize,
}

/// Result of aggregating one event stream
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationOutcome {
    pub matches: Vec<AggregatedMatch>,
    pub stats: AggregationStats,
}

impl AggregationOutcome {
    /// A source is done once any of its matches ended with a nonzero duration.
    /// A trailing match that never ended (server crash) does not hold the file back.
    pub fn is_markable(&self) -> bool {
        self.matches.iter().any(AggregatedMatch::is_complete)
    }
}

/// Match being built from the event stream
#[derive(Debug, Clone)]
struct MatchBuilder {
    record: MatchRecord,
    players: BTreeMap<String, PlayerMatchStats>,
    duration_fixed: bool,
}

impl MatchBuilder {
    fn new(ip: &str) -> Self {
        Self {
            record: MatchRecord::new(ip),
            players: BTreeMap::new(),
            duration_fixed: false,
        }
    }

    fn has_data(&self) -> bool {
        self.record.has_map()
            || !self.players.is_empty()
            || self.record.rounds_won > 0
            || self.record.won
    }

    fn player(&mut self, player: &Player) -> &mut PlayerMatchStats {
        let stats = self
            .players
            .entry(player.id.clone())
            .or_insert_with(|| PlayerMatchStats::new(player.id.clone()));
        stats.observe_name(&player.name);
        stats
    }

    fn build(self) -> AggregatedMatch {
        AggregatedMatch {
            record: self.record,
            players: self.players,
        }
    }
}

/// State machine folding events into matches
pub struct MatchAggregator {
    ip: String,
    normalizer: TimeNormalizer,
    state: MatchState,
    current: MatchBuilder,
    completed: Vec<AggregatedMatch>,
    stats: AggregationStats,
}

impl MatchAggregator {
    /// Create an aggregator for a log file from server `ip`
    pub fn new(ip: impl Into<String>, normalizer: TimeNormalizer) -> Self {
        let ip = ip.into();
        let current = MatchBuilder::new(&ip);
        Self {
            ip,
            normalizer,
            state: MatchState::Idle,
            current,
            completed: Vec::new(),
            stats: AggregationStats::default(),
        }
    }

    pub fn state(&self) -> MatchState {
        self.state
    }

    pub fn stats(&self) -> &AggregationStats {
        &self.stats
    }

    /// Parse one raw line and apply it.
    ///
    /// Parse failures are reported and otherwise ignored.
    pub fn feed_line(&mut self, line: &str) {
        self.stats.lines_read += 1;
        match log_parser::parse_line(line) {
            Ok(Some(event)) => self.apply(&event),
            Ok(None) => {}
            Err(err) => {
                self.stats.parse_failures += 1;
                warn!(
                    ip = %self.ip,
                    line = self.stats.lines_read,
                    error = %err,
                    "failed to parse log line"
                );
            }
        }
    }

    /// Apply a single event
    pub fn apply(&mut self, event: &LogEvent) {
        self.stats.events_applied += 1;
        trace!(ip = %self.ip, event = event.kind(), time = event.time(), state = ?self.state, "applying event");

        match event {
            LogEvent::MapLoad { map, time } => {
                if self.state == MatchState::InMatch {
                    debug!(ip = %self.ip, from = %self.current.record.map, to = %map, "forced map change");
                    self.fix_duration(*time);
                    self.close_current();
                }
                self.current.record.map = map.clone();
                self.current.record.started_at = self.normalizer.normalize(*time);
                self.state = MatchState::InMatch;
            }

            LogEvent::PlayerKill {
                attacker,
                victim,
                weapon,
                ..
            } => match (attacker.is_bot(), victim.is_bot()) {
                (false, true) => self.current.player(attacker).record_kill(weapon),
                (true, false) => self.current.player(victim).record_death(),
                _ => self.stats.kills_ignored += 1,
            },

            LogEvent::RoundWin { team, time } => match team {
                Team::Defense => self.current.record.rounds_won += 1,
                Team::Attack => {
                    self.current.record.won = true;
                    self.fix_duration(*time);
                }
            },

            LogEvent::LevelChange { level, time } => {
                if !level.is_empty() {
                    self.fix_duration(*time);
                }
            }

            LogEvent::ServerMessage { text, time } => {
                if text == QUIT_MESSAGE {
                    self.fix_duration(*time);
                    self.close_current();
                    self.state = MatchState::Finished;
                }
            }
        }
    }

    /// Close the stream and return every resolvable match
    pub fn finish(mut self) -> AggregationOutcome {
        self.close_current();
        self.state = MatchState::Finished;
        AggregationOutcome {
            matches: self.completed,
            stats: self.stats,
        }
    }

    /// Fix the duration from the first end trigger; later triggers are no-ops
    fn fix_duration(&mut self, raw_time: i64) {
        if self.state != MatchState::InMatch || self.current.duration_fixed {
            return;
        }
        let ended_at = self.normalizer.normalize(raw_time);
        self.current.record.duration_seconds = elapsed_secs(self.current.record.started_at, ended_at);
        self.current.duration_fixed = true;
    }

    /// Emit the current match (if it has a map) and start a fresh one
    fn close_current(&mut self) {
        let finished = std::mem::replace(&mut self.current, MatchBuilder::new(&self.ip));
        if finished.record.has_map() {
            self.completed.push(finished.build());
        } else if finished.has_data() {
            self.stats.matches_discarded += 1;
            debug!(ip = %self.ip, "discarding match without map");
        }
    }
}

/// Aggregate an in-memory sequence of lines
pub fn aggregate_lines<I, S>(ip: &str, normalizer: TimeNormalizer, lines: I) -> AggregationOutcome
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut aggregator = MatchAggregator::new(ip, normalizer);
    for line in lines {
        aggregator.feed_line(line.as_ref());
    }
    aggregator.finish()
}

/// Aggregate an already-parsed event sequence
pub fn aggregate_events<'a, I>(ip: &str, normalizer: TimeNormalizer, events: I) -> AggregationOutcome
where
    I: IntoIterator<Item = &'a LogEvent>,
{
    let mut aggregator = MatchAggregator::new(ip, normalizer);
    for event in events {
        aggregator.apply(event);
    }
    aggregator.finish()
}
