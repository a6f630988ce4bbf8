//! Match and per-player statistics

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Weapon id -> kill count
pub type WeaponHistogram = BTreeMap<String, u32>;

/// Natural identity of a match across reprocessing
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MatchKey {
    pub ip: String,
    pub started_at: i64,
    pub map: String,
}

/// One match as reconstructed from a log file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub ip: String,
    /// Normalized epoch of the map load
    #[serde(rename = "startedAt")]
    pub started_at: i64,
    pub map: String,
    #[serde(rename = "roundsWon")]
    pub rounds_won: u32,
    #[serde(rename = "durationSeconds")]
    pub duration_seconds: u32,
    pub won: bool,
}

impl MatchRecord {
    /// Create an empty record for a server
    pub fn new(ip: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            started_at: 0,
            map: String::new(),
            rounds_won: 0,
            duration_seconds: 0,
            won: false,
        }
    }

    /// Dedup key `(ip, started_at, map)`
    pub fn key(&self) -> MatchKey {
        MatchKey {
            ip: self.ip.clone(),
            started_at: self.started_at,
            map: self.map.clone(),
        }
    }

    /// A match is resolvable only once a map has been seen
    pub fn has_map(&self) -> bool {
        !self.map.is_empty()
    }
}

/// Totals for one player within one match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerMatchStats {
    /// Steam id string as found in the log
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
    pub kills: u32,
    pub deaths: u32,
    #[serde(rename = "weaponHistogram", default)]
    pub weapon_histogram: WeaponHistogram,
}

impl PlayerMatchStats {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: String::new(),
            kills: 0,
            deaths: 0,
            weapon_histogram: WeaponHistogram::new(),
        }
    }

    /// Keep the first non-empty name seen for the player
    pub fn observe_name(&mut self, name: &str) {
        if self.display_name.is_empty() {
            self.display_name = name.to_string();
        }
    }

    pub fn record_kill(&mut self, weapon: &str) {
        self.kills += 1;
        *self.weapon_histogram.entry(weapon.to_string()).or_insert(0) += 1;
    }

    pub fn record_death(&mut self) {
        self.deaths += 1;
    }
}

/// A finished match ready to hand to the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedMatch {
    pub record: MatchRecord,
    /// Keyed by steam id
    pub players: BTreeMap<String, PlayerMatchStats>,
}

impl AggregatedMatch {
    /// Whether an end trigger fixed a nonzero duration
    pub fn is_complete(&self) -> bool {
        self.record.duration_seconds > 0
    }

    /// Number of human participants with any recorded stat
    pub fn player_count(&self) -> usize {
        self.players.len()
    }
}

/// Cumulative per-user statistics maintained by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAggregate {
    pub id: i64,
    pub name: String,
    pub kills: i64,
    pub deaths: i64,
    pub kd: f64,
    #[serde(rename = "allWeaponStats", default)]
    pub weapon_histogram: BTreeMap<String, i64>,
    /// Normalized start of the user's earliest match
    #[serde(rename = "firstSeen", skip_serializing_if = "Option::is_none")]
    pub first_seen: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_kill_updates_histogram() {
        let mut stats = PlayerMatchStats::new("STEAM_1:0:1");
        stats.record_kill("weapon_ak74");
        stats.record_kill("weapon_ak74");
        stats.record_kill("weapon_m9");

        assert_eq!(stats.kills, 3);
        assert_eq!(stats.weapon_histogram["weapon_ak74"], 2);
        assert_eq!(stats.weapon_histogram["weapon_m9"], 1);
    }

    #[test]
    fn test_first_name_wins() {
        let mut stats = PlayerMatchStats::new("STEAM_1:0:1");
        stats.observe_name("");
        stats.observe_name("Alice");
        stats.observe_name("Alice (renamed)");
        assert_eq!(stats.display_name, "Alice");
    }

    #[test]
    fn test_match_key() {
        let mut record = MatchRecord::new("10.0.0.1");
        assert!(!record.has_map());
        record.map = "Town".to_string();
        record.started_at = 99;

        let key = record.key();
        assert_eq!(key.ip, "10.0.0.1");
        assert_eq!(key.started_at, 99);
        assert_eq!(key.map, "Town");
    }
}
