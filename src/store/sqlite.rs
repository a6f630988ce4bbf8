//! SQLite implementation of the persistence gateway

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::StatsResult;
use crate::types::{
    AggregatedMatch, MatchKey, MatchRecord, MedalKind, MedalRecord, MetricValue, UserAggregate,
    WeaponHistogram,
};
use crate::utils::account_id;

use super::schema;
use super::{LeaderboardMetric, MatchStore, MedalStore, ThresholdMetric, ThresholdQuery};

const UPSERT_MATCH: &str = r#"
INSERT INTO matches (ip, started_at, map, rounds, duration, won)
VALUES (?1, ?2, ?3, ?4, ?5, ?6)
ON CONFLICT(ip, started_at, map) DO UPDATE SET rounds = ?4, duration = ?5, won = ?6
RETURNING id
"#;

const UPSERT_MATCH_USER_STATS: &str = r#"
INSERT INTO match_user_stats (match_id, user_id, kills, deaths, weapon_stats)
VALUES (?1, ?2, ?3, ?4, ?5)
ON CONFLICT(match_id, user_id) DO UPDATE SET kills = ?3, deaths = ?4, weapon_stats = ?5
"#;

const REFRESH_USER_TOTALS: &str = r#"
UPDATE users SET
    kills = (SELECT COALESCE(SUM(kills), 0) FROM match_user_stats WHERE user_id = ?1),
    deaths = (SELECT COALESCE(SUM(deaths), 0) FROM match_user_stats WHERE user_id = ?1),
    first_seen = (
        SELECT MIN(m.started_at)
        FROM match_user_stats s JOIN matches m ON m.id = s.match_id
        WHERE s.user_id = ?1
    )
WHERE id = ?1
"#;

const UPSERT_HOLDER: &str = r#"
INSERT INTO user_medals (user_id, medal_id, value, current)
VALUES (?1, ?2, ?3, 1)
ON CONFLICT(user_id, medal_id) DO UPDATE SET value = excluded.value, current = 1
"#;

/// Per-match player row as stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredPlayerStats {
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub kills: i64,
    pub deaths: i64,
    #[serde(rename = "weaponStats")]
    pub weapon_histogram: WeaponHistogram,
}

/// Stats store backed by a single SQLite connection
pub struct SqliteStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open (and migrate) a database file
    pub fn open<P: AsRef<Path>>(path: P) -> StatsResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::init(conn, Some(path.to_path_buf()))
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> StatsResult<Self> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> StatsResult<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        schema::migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    /// Database file path (`None` for in-memory stores)
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Look up a match by its natural identity
    pub fn match_by_key(&self, key: &MatchKey) -> StatsResult<Option<(i64, MatchRecord)>> {
        let conn = self.conn.lock();
        let found = conn
            .query_row(
                "SELECT id, ip, started_at, map, rounds, duration, won FROM matches
                 WHERE ip = ?1 AND started_at = ?2 AND map = ?3",
                params![key.ip, key.started_at, key.map],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        MatchRecord {
                            ip: row.get(1)?,
                            started_at: row.get(2)?,
                            map: row.get(3)?,
                            rounds_won: row.get(4)?,
                            duration_seconds: row.get(5)?,
                            won: row.get(6)?,
                        },
                    ))
                },
            )
            .optional()?;
        Ok(found)
    }

    /// Number of stored matches
    pub fn match_count(&self) -> StatsResult<i64> {
        let conn = self.conn.lock();
        Ok(conn.query_row("SELECT COUNT(*) FROM matches", [], |row| row.get(0))?)
    }

    /// Player rows of one match, ordered by user id
    pub fn match_player_stats(&self, match_id: i64) -> StatsResult<Vec<StoredPlayerStats>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT user_id, kills, deaths, weapon_stats FROM match_user_stats
             WHERE match_id = ?1 ORDER BY user_id",
        )?;
        let rows = stmt.query_map(params![match_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (user_id, kills, deaths, weapon_json) = row?;
            out.push(StoredPlayerStats {
                user_id,
                kills,
                deaths,
                weapon_histogram: serde_json::from_str(&weapon_json)?,
            });
        }
        Ok(out)
    }

    /// Cumulative statistics of one user
    pub fn user_aggregate(&self, user_id: i64) -> StatsResult<Option<UserAggregate>> {
        let conn = self.conn.lock();
        let row = conn
            .query_row(
                "SELECT id, name, kills, deaths, kd, all_weapon_stats, first_seen FROM users WHERE id = ?1",
                params![user_id],
                |row| {
                    Ok((
                        UserAggregate {
                            id: row.get(0)?,
                            name: row.get(1)?,
                            kills: row.get(2)?,
                            deaths: row.get(3)?,
                            kd: row.get(4)?,
                            weapon_histogram: BTreeMap::new(),
                            first_seen: row.get(6)?,
                        },
                        row.get::<_, String>(5)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((mut aggregate, weapon_json)) => {
                aggregate.weapon_histogram = serde_json::from_str(&weapon_json)?;
                Ok(Some(aggregate))
            }
            None => Ok(None),
        }
    }

    /// All medals held by a user, ordered by medal id
    pub fn medals_for(&self, user_id: i64) -> StatsResult<Vec<MedalRecord>> {
        self.query_medals(
            "SELECT user_id, medal_id, value, current FROM user_medals
             WHERE user_id = ?1 ORDER BY medal_id",
            user_id,
        )
    }

    /// Every record of one medal kind, ordered by user id
    pub fn medals_of_kind(&self, kind: MedalKind) -> StatsResult<Vec<MedalRecord>> {
        self.query_medals(
            "SELECT user_id, medal_id, value, current FROM user_medals
             WHERE medal_id = ?1 ORDER BY user_id",
            kind.id(),
        )
    }

    fn query_medals(&self, sql: &str, arg: i64) -> StatsResult<Vec<MedalRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params![arg], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, bool>(3)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (user_id, medal_id, value, current) = row?;
            // Rows written by newer versions with unknown ids are skipped
            if let Some(kind) = MedalKind::from_id(medal_id) {
                out.push(MedalRecord {
                    user_id,
                    kind,
                    value,
                    is_current_holder: current,
                });
            }
        }
        Ok(out)
    }
}

/// Recompute one user's cumulative row from their per-match rows
fn refresh_user_aggregate(tx: &Transaction<'_>, user_id: i64) -> StatsResult<()> {
    tx.execute(REFRESH_USER_TOTALS, params![user_id])?;
    tx.execute(
        "UPDATE users SET kd = CAST(kills AS REAL) / MAX(deaths, 1) WHERE id = ?1",
        params![user_id],
    )?;

    let mut totals: BTreeMap<String, i64> = BTreeMap::new();
    {
        let mut stmt = tx.prepare_cached("SELECT weapon_stats FROM match_user_stats WHERE user_id = ?1")?;
        let rows = stmt.query_map(params![user_id], |row| row.get::<_, String>(0))?;
        for row in rows {
            let histogram: BTreeMap<String, i64> = serde_json::from_str(&row?)?;
            for (weapon, count) in histogram {
                *totals.entry(weapon).or_insert(0) += count;
            }
        }
    }

    tx.execute(
        "UPDATE users SET all_weapon_stats = ?1 WHERE id = ?2",
        params![serde_json::to_string(&totals)?, user_id],
    )?;
    Ok(())
}

fn metric_from_row(row: &Row<'_>) -> rusqlite::Result<MetricValue> {
    Ok(MetricValue::new(row.get(0)?, row.get(1)?))
}

/// SQL yielding `(user_id, value)` rows, plus the value bound to `?3` if the
/// query needs one
fn threshold_metric_sql(metric: &ThresholdMetric, as_of: i64) -> StatsResult<(&'static str, Option<Value>)> {
    let sql = match metric {
        ThresholdMetric::MatchesWon => {
            r#"
            SELECT s.user_id AS user_id, COUNT(*) AS value
            FROM match_user_stats s JOIN matches m ON m.id = s.match_id
            WHERE m.won = 1
            GROUP BY s.user_id
            "#
        }
        ThresholdMetric::LongestWinStreak => {
            // Gaps and islands: consecutive wins share the same row-number difference
            r#"
            SELECT user_id, MAX(streak) AS value FROM (
                SELECT user_id, COUNT(*) AS streak FROM (
                    SELECT s.user_id AS user_id, m.won AS won,
                        ROW_NUMBER() OVER (PARTITION BY s.user_id ORDER BY m.started_at, m.id)
                        - ROW_NUMBER() OVER (PARTITION BY s.user_id, m.won ORDER BY m.started_at, m.id) AS grp
                    FROM match_user_stats s JOIN matches m ON m.id = s.match_id
                )
                WHERE won = 1
                GROUP BY user_id, grp
            )
            GROUP BY user_id
            "#
        }
        ThresholdMetric::TopFragMatches => {
            r#"
            SELECT s.user_id AS user_id, COUNT(*) AS value
            FROM match_user_stats s
            WHERE s.kills > 0
              AND s.kills = (SELECT MAX(o.kills) FROM match_user_stats o WHERE o.match_id = s.match_id)
            GROUP BY s.user_id
            "#
        }
        ThresholdMetric::AboveAverageKdMatches => {
            r#"
            SELECT s.user_id AS user_id, COUNT(*) AS value
            FROM match_user_stats s
            WHERE CAST(s.kills AS REAL) / MAX(s.deaths, 1) > (
                SELECT AVG(CAST(o.kills AS REAL) / MAX(o.deaths, 1))
                FROM match_user_stats o WHERE o.match_id = s.match_id
            )
            GROUP BY s.user_id
            "#
        }
        ThresholdMetric::WeaponKills(weapons) => {
            let list = serde_json::to_string(weapons)?;
            return Ok((
                r#"
                SELECT u.id AS user_id, SUM(w.value) AS value
                FROM users u, json_each(u.all_weapon_stats) w
                WHERE w.key IN (SELECT value FROM json_each(?3))
                GROUP BY u.id
                "#,
                Some(Value::Text(list)),
            ));
        }
        ThresholdMetric::SoloWins => {
            r#"
            SELECT s.user_id AS user_id, COUNT(*) AS value
            FROM match_user_stats s JOIN matches m ON m.id = s.match_id
            WHERE m.won = 1
              AND (SELECT COUNT(*) FROM match_user_stats o WHERE o.match_id = s.match_id) = 1
            GROUP BY s.user_id
            "#
        }
        ThresholdMetric::FlawlessWins => {
            r#"
            SELECT s.user_id AS user_id, COUNT(*) AS value
            FROM match_user_stats s JOIN matches m ON m.id = s.match_id
            WHERE m.won = 1 AND s.deaths = 0
            GROUP BY s.user_id
            "#
        }
        ThresholdMetric::DaysSinceFirstMatch => {
            return Ok((
                r#"
                SELECT id AS user_id, (?3 - first_seen) / 86400 AS value
                FROM users
                WHERE first_seen IS NOT NULL
                "#,
                Some(Value::Integer(as_of)),
            ));
        }
    };
    Ok((sql, None))
}

impl MatchStore for SqliteStore {
    fn persist_match(&self, aggregated: &AggregatedMatch) -> StatsResult<i64> {
        // Resolve every steam id first so a bad one leaves nothing behind
        let mut players = Vec::with_capacity(aggregated.players.len());
        for stats in aggregated.players.values() {
            players.push((account_id(&stats.user_id)?, stats));
        }

        let record = &aggregated.record;
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let match_id: i64 = tx.query_row(
            UPSERT_MATCH,
            params![
                record.ip,
                record.started_at,
                record.map,
                record.rounds_won,
                record.duration_seconds,
                record.won
            ],
            |row| row.get(0),
        )?;

        for (user_id, stats) in players {
            tx.execute(
                "INSERT INTO users (id, name) VALUES (?1, ?2) ON CONFLICT(id) DO NOTHING",
                params![user_id, stats.display_name],
            )?;
            tx.execute(
                UPSERT_MATCH_USER_STATS,
                params![
                    match_id,
                    user_id,
                    stats.kills,
                    stats.deaths,
                    serde_json::to_string(&stats.weapon_histogram)?
                ],
            )?;
            refresh_user_aggregate(&tx, user_id)?;
        }

        tx.commit()?;
        debug!(match_id, map = %record.map, players = aggregated.players.len(), "persisted match");
        Ok(match_id)
    }
}

impl MedalStore for SqliteStore {
    fn top_user(&self, metric: LeaderboardMetric) -> StatsResult<Option<MetricValue>> {
        let sql = match metric {
            LeaderboardMetric::Kills => {
                "SELECT id, kills FROM users WHERE kills > 0 ORDER BY kills DESC, id ASC LIMIT 1"
            }
            LeaderboardMetric::KdHundredths => {
                "SELECT id, CAST(ROUND(kd * 100) AS INTEGER) FROM users
                 WHERE kills > 0 ORDER BY kd DESC, id ASC LIMIT 1"
            }
        };
        let conn = self.conn.lock();
        Ok(conn.query_row(sql, [], metric_from_row).optional()?)
    }

    fn current_holder(&self, kind: MedalKind) -> StatsResult<Option<MedalRecord>> {
        let conn = self.conn.lock();
        let holder = conn
            .query_row(
                "SELECT user_id, value FROM user_medals WHERE medal_id = ?1 AND current = 1",
                params![kind.id()],
                |row| {
                    Ok(MedalRecord {
                        user_id: row.get(0)?,
                        kind,
                        value: row.get(1)?,
                        is_current_holder: true,
                    })
                },
            )
            .optional()?;
        Ok(holder)
    }

    fn award_holder(&self, kind: MedalKind, holder: MetricValue) -> StatsResult<()> {
        let conn = self.conn.lock();
        conn.execute(UPSERT_HOLDER, params![holder.user_id, kind.id(), holder.value])?;
        Ok(())
    }

    fn update_holder_value(&self, kind: MedalKind, holder: MetricValue) -> StatsResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE user_medals SET value = ?1 WHERE user_id = ?2 AND medal_id = ?3 AND current = 1",
            params![holder.value, holder.user_id, kind.id()],
        )?;
        Ok(())
    }

    fn transfer_holder(&self, kind: MedalKind, previous: i64, next: MetricValue) -> StatsResult<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        // Demote first: the partial unique index allows one current row per medal
        tx.execute(
            "UPDATE user_medals SET current = 0 WHERE user_id = ?1 AND medal_id = ?2 AND current = 1",
            params![previous, kind.id()],
        )?;
        tx.execute(UPSERT_HOLDER, params![next.user_id, kind.id(), next.value])?;
        tx.commit()?;
        Ok(())
    }

    fn threshold_candidates(&self, query: &ThresholdQuery<'_>) -> StatsResult<Vec<MetricValue>> {
        let (metric_sql, extra) = threshold_metric_sql(query.metric, query.as_of)?;
        let sql = format!(
            r#"
            SELECT user_id, value FROM ({metric_sql}) AS metric
            WHERE value >= ?1
              AND NOT EXISTS (
                  SELECT 1 FROM user_medals um
                  WHERE um.user_id = metric.user_id AND um.medal_id = ?2
              )
            ORDER BY user_id
            "#
        );

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let rows = match extra {
            Some(value) => stmt.query_map(params![query.threshold, query.kind.id(), value], metric_from_row)?,
            None => stmt.query_map(params![query.threshold, query.kind.id()], metric_from_row)?,
        };

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn grant_medal(&self, kind: MedalKind, grant: MetricValue) -> StatsResult<bool> {
        let conn = self.conn.lock();
        let inserted = conn.execute(
            "INSERT INTO user_medals (user_id, medal_id, value, current) VALUES (?1, ?2, ?3, 0)
             ON CONFLICT(user_id, medal_id) DO NOTHING",
            params![grant.user_id, kind.id(), grant.value],
        )?;
        Ok(inserted == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PlayerMatchStats;

    const ALICE: &str = "STEAM_1:0:100"; // account 200
    const BOB: &str = "STEAM_1:1:100"; // account 201

    fn player(id: &str, name: &str, kills: u32, deaths: u32, weapon: &str) -> PlayerMatchStats {
        let mut stats = PlayerMatchStats::new(id);
        stats.observe_name(name);
        for _ in 0..kills {
            stats.record_kill(weapon);
        }
        stats.deaths = deaths;
        stats
    }

    fn sample_match(started_at: i64, won: bool, players: Vec<PlayerMatchStats>) -> AggregatedMatch {
        AggregatedMatch {
            record: MatchRecord {
                ip: "10.0.0.1".to_string(),
                started_at,
                map: "Town".to_string(),
                rounds_won: 2,
                duration_seconds: 900,
                won,
            },
            players: players.into_iter().map(|p| (p.user_id.clone(), p)).collect(),
        }
    }

    #[test]
    fn test_persist_match_creates_rows() {
        let store = SqliteStore::open_in_memory().unwrap();
        let m = sample_match(
            100,
            true,
            vec![player(ALICE, "Alice", 3, 1, "weapon_ak74"), player(BOB, "Bob", 0, 2, "x")],
        );

        let match_id = store.persist_match(&m).unwrap();
        let (stored_id, record) = store.match_by_key(&m.record.key()).unwrap().unwrap();
        assert_eq!(stored_id, match_id);
        assert_eq!(record, m.record);

        let rows = store.match_player_stats(match_id).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].user_id, 200);
        assert_eq!(rows[0].kills, 3);
        assert_eq!(rows[0].weapon_histogram["weapon_ak74"], 3);
        assert_eq!(rows[1].user_id, 201);
        assert_eq!(rows[1].deaths, 2);

        let alice = store.user_aggregate(200).unwrap().unwrap();
        assert_eq!(alice.name, "Alice");
        assert_eq!((alice.kills, alice.deaths), (3, 1));
        assert_eq!(alice.kd, 3.0);
        assert_eq!(alice.first_seen, Some(100));
    }

    #[test]
    fn test_persist_is_idempotent() {
        let store = SqliteStore::open_in_memory().unwrap();
        let m = sample_match(100, true, vec![player(ALICE, "Alice", 3, 1, "weapon_ak74")]);

        let first = store.persist_match(&m).unwrap();
        let second = store.persist_match(&m).unwrap();
        assert_eq!(first, second);
        assert_eq!(store.match_count().unwrap(), 1);

        let alice = store.user_aggregate(200).unwrap().unwrap();
        assert_eq!(alice.kills, 3);
        assert_eq!(alice.weapon_histogram["weapon_ak74"], 3);
    }

    #[test]
    fn test_reprocessing_replaces_values() {
        let store = SqliteStore::open_in_memory().unwrap();
        let partial = sample_match(100, false, vec![player(ALICE, "Alice", 2, 0, "weapon_m9")]);
        let full = sample_match(100, true, vec![player(ALICE, "Alice", 5, 1, "weapon_m9")]);

        let id = store.persist_match(&partial).unwrap();
        store.persist_match(&full).unwrap();

        let rows = store.match_player_stats(id).unwrap();
        assert_eq!(rows[0].kills, 5);
        let (_, record) = store.match_by_key(&full.record.key()).unwrap().unwrap();
        assert!(record.won);
        assert_eq!(store.user_aggregate(200).unwrap().unwrap().kills, 5);
    }

    #[test]
    fn test_aggregate_sums_across_matches() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .persist_match(&sample_match(100, true, vec![player(ALICE, "Alice", 2, 0, "weapon_m9")]))
            .unwrap();
        store
            .persist_match(&sample_match(50, false, vec![player(ALICE, "Renamed", 4, 2, "weapon_akm")]))
            .unwrap();

        let alice = store.user_aggregate(200).unwrap().unwrap();
        assert_eq!(alice.name, "Alice");
        assert_eq!((alice.kills, alice.deaths), (6, 2));
        assert_eq!(alice.kd, 3.0);
        assert_eq!(alice.weapon_histogram["weapon_m9"], 2);
        assert_eq!(alice.weapon_histogram["weapon_akm"], 4);
        assert_eq!(alice.first_seen, Some(50));
    }

    #[test]
    fn test_invalid_steam_id_leaves_no_rows() {
        let store = SqliteStore::open_in_memory().unwrap();
        let m = sample_match(
            100,
            true,
            vec![player(ALICE, "Alice", 1, 0, "weapon_m9"), player("garbage", "X", 1, 0, "weapon_m9")],
        );

        let err = store.persist_match(&m).unwrap_err();
        assert!(err.is_file_scoped());
        assert_eq!(store.match_count().unwrap(), 0);
    }

    #[test]
    fn test_transfer_holder_is_atomic() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .persist_match(&sample_match(
                100,
                true,
                vec![player(ALICE, "Alice", 10, 0, "w"), player(BOB, "Bob", 15, 0, "w")],
            ))
            .unwrap();

        store
            .award_holder(MedalKind::MostKillsCurrent, MetricValue::new(200, 10))
            .unwrap();
        store
            .transfer_holder(MedalKind::MostKillsCurrent, 200, MetricValue::new(201, 15))
            .unwrap();

        let records = store.medals_of_kind(MedalKind::MostKillsCurrent).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records.iter().filter(|r| r.is_current_holder).count(), 1);

        let holder = store.current_holder(MedalKind::MostKillsCurrent).unwrap().unwrap();
        assert_eq!((holder.user_id, holder.value), (201, 15));
    }

    #[test]
    fn test_grant_medal_is_one_shot() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .persist_match(&sample_match(100, true, vec![player(ALICE, "Alice", 1, 0, "w")]))
            .unwrap();

        assert!(store.grant_medal(MedalKind::IWon, MetricValue::new(200, 3)).unwrap());
        assert!(!store.grant_medal(MedalKind::IWon, MetricValue::new(200, 4)).unwrap());

        let medals = store.medals_for(200).unwrap();
        assert_eq!(medals.len(), 1);
        assert_eq!(medals[0].value, 3);
        assert!(!medals[0].is_current_holder);
    }

    #[test]
    fn test_win_streak_metric() {
        let store = SqliteStore::open_in_memory().unwrap();
        // W W L W W W
        for (i, won) in [true, true, false, true, true, true].into_iter().enumerate() {
            store
                .persist_match(&sample_match(i as i64 * 1000, won, vec![player(ALICE, "Alice", 1, 0, "w")]))
                .unwrap();
        }

        let metric = ThresholdMetric::LongestWinStreak;
        let query = ThresholdQuery {
            metric: &metric,
            threshold: 3,
            kind: MedalKind::ImOnAStreak,
            as_of: 0,
        };
        assert_eq!(store.threshold_candidates(&query).unwrap(), vec![MetricValue::new(200, 3)]);

        let query = ThresholdQuery { threshold: 4, ..query };
        assert!(store.threshold_candidates(&query).unwrap().is_empty());
    }

    #[test]
    fn test_weapon_kills_metric_sums_category() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut alice = player(ALICE, "Alice", 2, 0, "weapon_mosin");
        alice.record_kill("weapon_m40a1");
        alice.record_kill("weapon_ak74");
        store.persist_match(&sample_match(0, true, vec![alice])).unwrap();

        let metric =
            ThresholdMetric::WeaponKills(vec!["weapon_mosin".to_string(), "weapon_m40a1".to_string()]);
        let query = ThresholdQuery {
            metric: &metric,
            threshold: 3,
            kind: MedalKind::RifleExpert,
            as_of: 0,
        };
        assert_eq!(store.threshold_candidates(&query).unwrap(), vec![MetricValue::new(200, 3)]);
    }

    #[test]
    fn test_days_since_first_match_metric() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .persist_match(&sample_match(0, false, vec![player(ALICE, "Alice", 0, 1, "w")]))
            .unwrap();

        let metric = ThresholdMetric::DaysSinceFirstMatch;
        let query = ThresholdQuery {
            metric: &metric,
            threshold: 182,
            kind: MedalKind::SixMonths,
            as_of: 181 * 86_400,
        };
        assert!(store.threshold_candidates(&query).unwrap().is_empty());

        let query = ThresholdQuery {
            as_of: 182 * 86_400 + 5,
            ..query
        };
        assert_eq!(store.threshold_candidates(&query).unwrap(), vec![MetricValue::new(200, 182)]);
    }

    #[test]
    fn test_open_file_store_persists() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("stats.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            assert_eq!(store.path(), Some(path.as_path()));
            store
                .persist_match(&sample_match(1, true, vec![player(ALICE, "Alice", 1, 0, "w")]))
                .unwrap();
        }

        let reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(reopened.match_count().unwrap(), 1);
    }
}
