//! Data types for the stats pipeline
//!
//! This module contains the core data structures shared by the parser,
//! aggregator, store and medal engine.

mod event;
mod match_record;
mod medal;

pub use event::{LogEvent, Player, Team, BOT_ID};
pub use match_record::{
    AggregatedMatch, MatchKey, MatchRecord, PlayerMatchStats, UserAggregate, WeaponHistogram,
};
pub use medal::{MedalKind, MedalRecord, MetricValue};
