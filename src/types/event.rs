//! Log event types
//!
//! One `LogEvent` is produced per recognised log line. Events are consumed
//! immediately by the match aggregator and never stored.

use serde::{Deserialize, Serialize};

/// Steam id reported for computer-controlled players
pub const BOT_ID: &str = "BOT";

/// Player reference as it appears in a kill line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Steam id string, or `BOT`
    pub id: String,
    pub name: String,
}

impl Player {
    /// Create a new player reference
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Create a bot reference
    pub fn bot(name: impl Into<String>) -> Self {
        Self::new(BOT_ID, name)
    }

    /// Check if this is the bot sentinel
    pub fn is_bot(&self) -> bool {
        self.id == BOT_ID
    }
}

/// Side of a co-op round
///
/// Humans defend as Security; a win for the attacking Insurgent side
/// ends the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    Attack,
    Defense,
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Team::Attack => write!(f, "attack"),
            Team::Defense => write!(f, "defense"),
        }
    }
}

/// A typed log event
///
/// `time` is the raw server-local epoch; normalize it before any comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LogEvent {
    MapLoad {
        map: String,
        time: i64,
    },
    PlayerKill {
        attacker: Player,
        victim: Player,
        weapon: String,
        time: i64,
    },
    RoundWin {
        team: Team,
        time: i64,
    },
    LevelChange {
        level: String,
        time: i64,
    },
    ServerMessage {
        text: String,
        time: i64,
    },
}

impl LogEvent {
    /// Raw timestamp of the event
    pub fn time(&self) -> i64 {
        match self {
            LogEvent::MapLoad { time, .. }
            | LogEvent::PlayerKill { time, .. }
            | LogEvent::RoundWin { time, .. }
            | LogEvent::LevelChange { time, .. }
            | LogEvent::ServerMessage { time, .. } => *time,
        }
    }

    /// Short name used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            LogEvent::MapLoad { .. } => "map_load",
            LogEvent::PlayerKill { .. } => "player_kill",
            LogEvent::RoundWin { .. } => "round_win",
            LogEvent::LevelChange { .. } => "level_change",
            LogEvent::ServerMessage { .. } => "server_message",
        }
    }
}
