//! Log line parser
//!
//! Turns one Source-engine style server log line into a [`LogEvent`].
//!
//! ```text
//! L 10/19/2026 - 14:22:01: Loading map "ministry_coop"
//! L 10/19/2026 - 14:25:13: "Alice<2><STEAM_1:0:42><#Team_Security>" killed "Rifleman<5><BOT><#Team_Insurgent>" with "weapon_ak74"
//! L 10/19/2026 - 14:31:40: Team "#Team_Security" triggered "Round_Win"
//! L 10/19/2026 - 14:58:02: -------- Mapchange to sinjar_coop --------
//! L 10/19/2026 - 14:58:03: server_message: "quit"
//! ```
//!
//! Lines that carry a valid timestamp but no event of interest (cvars,
//! chat, connects) are skipped with `Ok(None)`. Lines that cannot be read
//! at all are reported as [`ParseError`].

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ParseError;
use crate::types::{LogEvent, Player, Team};

const TIMESTAMP_FORMAT: &str = "%m/%d/%Y - %H:%M:%S";
const TEAM_SECURITY: &str = "#Team_Security";
const TEAM_INSURGENT: &str = "#Team_Insurgent";

static LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^L (\d{2}/\d{2}/\d{4} - \d{2}:\d{2}:\d{2}): (.*)$").expect("valid line regex")
});
static MAP_LOAD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^Loading map "([^"]+)""#).expect("valid map load regex"));
static KILL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^"(.*?)<-?\d+><([^<>]*)><[^<>]*>" killed "(.*?)<-?\d+><([^<>]*)><[^<>]*>" with "([^"]*)""#,
    )
    .expect("valid kill regex")
});
static ROUND_WIN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^Team "([^"]+)" triggered "Round_Win""#).expect("valid round win regex")
});
static LEVEL_CHANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-+ Mapchange to (\S*) -+$").expect("valid level change regex")
});
static SERVER_MESSAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^server_message: "([^"]*)""#).expect("valid server message regex")
});

/// Parse a single log line.
pub fn parse_line(line: &str) -> Result<Option<LogEvent>, ParseError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Ok(None);
    }

    let caps = LINE_RE
        .captures(line)
        .ok_or_else(|| ParseError::new("missing timestamp", line))?;
    let time = parse_timestamp(&caps[1]).ok_or_else(|| ParseError::new("invalid timestamp", line))?;
    let body = &caps[2];

    if let Some(c) = MAP_LOAD_RE.captures(body) {
        return Ok(Some(LogEvent::MapLoad {
            map: c[1].to_string(),
            time,
        }));
    }

    if let Some(c) = KILL_RE.captures(body) {
        return Ok(Some(LogEvent::PlayerKill {
            attacker: Player::new(&c[2], &c[1]),
            victim: Player::new(&c[4], &c[3]),
            weapon: c[5].to_string(),
            time,
        }));
    }

    if let Some(c) = ROUND_WIN_RE.captures(body) {
        let team = match &c[1] {
            TEAM_SECURITY => Team::Defense,
            TEAM_INSURGENT => Team::Attack,
            _ => return Err(ParseError::new("unknown team", line)),
        };
        return Ok(Some(LogEvent::RoundWin { team, time }));
    }

    if let Some(c) = LEVEL_CHANGE_RE.captures(body) {
        return Ok(Some(LogEvent::LevelChange {
            level: c[1].to_string(),
            time,
        }));
    }

    if let Some(c) = SERVER_MESSAGE_RE.captures(body) {
        return Ok(Some(LogEvent::ServerMessage {
            text: c[1].to_string(),
            time,
        }));
    }

    Ok(None)
}

/// Read a log timestamp as a raw epoch (the wall clock is taken as UTC;
/// the configured offset is applied later by the normalizer).
pub fn parse_timestamp(text: &str) -> Option<i64> {
    NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT)
        .ok()
        .map(|dt| dt.and_utc().timestamp())
}
