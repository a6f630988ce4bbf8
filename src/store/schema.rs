//! SQLite schema and migrations
//!
//! The uniqueness rules the aggregator and medal engine rely on are
//! declared here so the database rejects violations even when more than
//! one process writes.

use rusqlite::Connection;
use tracing::info;

use crate::error::StatsResult;

/// Current schema version (stored in `PRAGMA user_version`)
pub const SCHEMA_VERSION: i64 = 1;

const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS matches (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    ip TEXT NOT NULL,
    started_at INTEGER NOT NULL,
    map TEXT NOT NULL,
    rounds INTEGER NOT NULL DEFAULT 0,
    duration INTEGER NOT NULL DEFAULT 0,
    won INTEGER NOT NULL DEFAULT 0,
    UNIQUE (ip, started_at, map)
);

CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    kills INTEGER NOT NULL DEFAULT 0,
    deaths INTEGER NOT NULL DEFAULT 0,
    kd REAL NOT NULL DEFAULT 0,
    all_weapon_stats TEXT NOT NULL DEFAULT '{}',
    first_seen INTEGER
);

CREATE TABLE IF NOT EXISTS match_user_stats (
    match_id INTEGER NOT NULL REFERENCES matches(id) ON DELETE CASCADE,
    user_id INTEGER NOT NULL REFERENCES users(id),
    kills INTEGER NOT NULL DEFAULT 0,
    deaths INTEGER NOT NULL DEFAULT 0,
    weapon_stats TEXT NOT NULL DEFAULT '{}',
    UNIQUE (match_id, user_id)
);

CREATE TABLE IF NOT EXISTS user_medals (
    user_id INTEGER NOT NULL REFERENCES users(id),
    medal_id INTEGER NOT NULL,
    value INTEGER NOT NULL DEFAULT 0,
    current INTEGER NOT NULL DEFAULT 0,
    UNIQUE (user_id, medal_id)
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_user_medals_single_holder
    ON user_medals(medal_id) WHERE current = 1;
CREATE INDEX IF NOT EXISTS idx_match_user_stats_user ON match_user_stats(user_id);
CREATE INDEX IF NOT EXISTS idx_users_kills ON users(kills);
"#;

/// Bring the database up to [`SCHEMA_VERSION`]. Safe to call repeatedly.
pub fn migrate(conn: &Connection) -> StatsResult<()> {
    let version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if version < 1 {
        conn.execute_batch(SCHEMA_V1)?;
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        info!(from = version, to = SCHEMA_VERSION, "migrated stats schema");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrate_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        migrate(&conn).unwrap();

        let version: i64 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn test_match_identity_is_unique() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();

        let insert = "INSERT INTO matches (ip, started_at, map) VALUES ('1.2.3.4', 10, 'Town')";
        conn.execute(insert, []).unwrap();
        assert!(conn.execute(insert, []).is_err());
    }

    #[test]
    fn test_single_holder_is_enforced() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();

        conn.execute_batch(
            "INSERT INTO users (id, name) VALUES (1, 'a'), (2, 'b');
             INSERT INTO user_medals (user_id, medal_id, value, current) VALUES (1, 1, 10, 1);
             INSERT INTO user_medals (user_id, medal_id, value, current) VALUES (2, 3, 3, 0);
             INSERT INTO user_medals (user_id, medal_id, value, current) VALUES (1, 3, 3, 0);",
        )
        .unwrap();

        let second_holder =
            conn.execute("INSERT INTO user_medals (user_id, medal_id, value, current) VALUES (2, 1, 15, 1)", []);
        assert!(second_holder.is_err());
    }
}
