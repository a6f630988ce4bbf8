//! Medal rules
//!
//! Two rule shapes cover the whole catalogue: a leaderboard rule keeps a
//! single current holder, a threshold rule grants a one-shot medal to every
//! user whose metric reaches a cutoff.

use crate::error::StatsResult;
use crate::store::{LeaderboardMetric, MedalStore, ThresholdMetric, ThresholdQuery};
use crate::types::MedalKind;

use super::{MedalRule, RuleOutcome};

/// A named group of weapon ids counted together for an expert medal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeaponCategory {
    pub kind: MedalKind,
    pub weapons: &'static [&'static str],
    pub cutoff: i64,
}

pub const MELEE: &[&str] = &["weapon_kabar", "weapon_gurkha", "weapon_knife", "weapon_bayonet"];

pub const PISTOLS: &[&str] = &[
    "weapon_m9",
    "weapon_m45",
    "weapon_m1911",
    "weapon_makarov",
    "weapon_model10",
    "weapon_webley",
];

pub const AK_FAMILY: &[&str] = &["weapon_akm", "weapon_ak74", "weapon_aks74u"];

pub const BOLT_ACTION_RIFLES: &[&str] = &["weapon_mosin", "weapon_m40a1", "weapon_enfield"];

pub const EXPLOSIVES: &[&str] = &[
    "grenade_m67",
    "grenade_f1",
    "grenade_m203_he",
    "grenade_gp25_he",
    "grenade_c4",
    "grenade_ied",
    "grenade_molotov",
    "grenade_anm14",
    "rocket_at4",
    "rocket_rpg7",
];

/// Expert medals, in medal id order
pub const WEAPON_CATEGORIES: [WeaponCategory; 5] = [
    WeaponCategory { kind: MedalKind::KnifeExpert, weapons: MELEE, cutoff: 100 },
    WeaponCategory { kind: MedalKind::PistolExpert, weapons: PISTOLS, cutoff: 500 },
    WeaponCategory { kind: MedalKind::AkExpert, weapons: AK_FAMILY, cutoff: 1000 },
    WeaponCategory { kind: MedalKind::RifleExpert, weapons: BOLT_ACTION_RIFLES, cutoff: 1000 },
    WeaponCategory { kind: MedalKind::ExplosivesExpert, weapons: EXPLOSIVES, cutoff: 500 },
];

/// The full catalogue, evaluated in medal id order
pub fn default_rules() -> Vec<Box<dyn MedalRule>> {
    let mut rules: Vec<Box<dyn MedalRule>> = vec![
        Box::new(LeaderboardRule::new(MedalKind::MostKillsCurrent, LeaderboardMetric::Kills)),
        Box::new(LeaderboardRule::new(MedalKind::HighestKdCurrent, LeaderboardMetric::KdHundredths)),
        Box::new(ThresholdRule::new(MedalKind::IWon, ThresholdMetric::MatchesWon, 3)),
        Box::new(ThresholdRule::new(MedalKind::ImOnAStreak, ThresholdMetric::LongestWinStreak, 3)),
        Box::new(ThresholdRule::new(MedalKind::TopFragger, ThresholdMetric::TopFragMatches, 5)),
        Box::new(ThresholdRule::new(MedalKind::GoodTeammate, ThresholdMetric::AboveAverageKdMatches, 5)),
    ];

    for category in WEAPON_CATEGORIES {
        rules.push(Box::new(ThresholdRule::weapon_category(category)));
    }

    rules.push(Box::new(ThresholdRule::new(MedalKind::OneManArmy, ThresholdMetric::SoloWins, 1)));
    rules.push(Box::new(ThresholdRule::new(MedalKind::DieHard, ThresholdMetric::FlawlessWins, 1)));

    for (kind, days) in [
        (MedalKind::SixMonths, 182),
        (MedalKind::OneYear, 365),
        (MedalKind::TwoYears, 730),
        (MedalKind::ThreeYears, 1095),
        (MedalKind::FourYears, 1460),
    ] {
        rules.push(Box::new(ThresholdRule::new(kind, ThresholdMetric::DaysSinceFirstMatch, days)));
    }

    rules
}

/// Leaderboard Rule
///
/// Keeps exactly one current holder for `kind`:
/// - no holder yet: the top user becomes the holder
/// - the top user already holds it: raise the stored value if it grew
/// - someone else holds it: transfer only on a strictly greater value
pub struct LeaderboardRule {
    kind: MedalKind,
    metric: LeaderboardMetric,
    name: String,
}

impl LeaderboardRule {
    pub fn new(kind: MedalKind, metric: LeaderboardMetric) -> Self {
        debug_assert!(kind.is_leaderboard(), "{kind} has no current holder");
        Self {
            kind,
            metric,
            name: format!("LeaderboardRule({kind})"),
        }
    }
}

impl MedalRule for LeaderboardRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> MedalKind {
        self.kind
    }

    fn evaluate(&self, store: &dyn MedalStore, _as_of: i64) -> StatsResult<RuleOutcome> {
        let Some(top) = store.top_user(self.metric)? else {
            return Ok(RuleOutcome::NoData);
        };

        let Some(holder) = store.current_holder(self.kind)? else {
            store.award_holder(self.kind, top)?;
            return Ok(RuleOutcome::HolderAwarded(top));
        };

        if top.value <= holder.value {
            return Ok(RuleOutcome::Unchanged);
        }

        if holder.user_id == top.user_id {
            store.update_holder_value(self.kind, top)?;
            Ok(RuleOutcome::HolderValueUpdated(top))
        } else {
            store.transfer_holder(self.kind, holder.user_id, top)?;
            Ok(RuleOutcome::HolderTransferred {
                previous: holder.user_id,
                next: top,
            })
        }
    }
}

/// Threshold Rule
///
/// Grants `kind` once to every user whose metric reaches `threshold`.
/// Users who already hold it are excluded by the store query.
pub struct ThresholdRule {
    kind: MedalKind,
    metric: ThresholdMetric,
    threshold: i64,
    name: String,
}

impl ThresholdRule {
    pub fn new(kind: MedalKind, metric: ThresholdMetric, threshold: i64) -> Self {
        debug_assert!(!kind.is_leaderboard(), "{kind} is a leaderboard medal");
        Self {
            kind,
            metric,
            threshold,
            name: format!("ThresholdRule({kind})"),
        }
    }

    /// Expert medal for a weapon category
    pub fn weapon_category(category: WeaponCategory) -> Self {
        let weapons = category.weapons.iter().map(|w| w.to_string()).collect();
        Self::new(category.kind, ThresholdMetric::WeaponKills(weapons), category.cutoff)
    }

    pub fn threshold(&self) -> i64 {
        self.threshold
    }

    pub fn metric(&self) -> &ThresholdMetric {
        &self.metric
    }
}

impl MedalRule for ThresholdRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> MedalKind {
        self.kind
    }

    fn evaluate(&self, store: &dyn MedalStore, as_of: i64) -> StatsResult<RuleOutcome> {
        let query = ThresholdQuery {
            metric: &self.metric,
            threshold: self.threshold,
            kind: self.kind,
            as_of,
        };

        let candidates = store.threshold_candidates(&query)?;
        if candidates.is_empty() {
            return Ok(RuleOutcome::NoData);
        }

        let mut granted = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if store.grant_medal(self.kind, candidate)? {
                granted.push(candidate);
            }
        }

        if granted.is_empty() {
            Ok(RuleOutcome::Unchanged)
        } else {
            Ok(RuleOutcome::Granted(granted))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::store::{MatchStore, SqliteStore};
    use crate::types::{AggregatedMatch, MatchRecord, MetricValue, PlayerMatchStats};

    const ALICE: &str = "STEAM_1:0:100"; // account 200
    const BOB: &str = "STEAM_1:1:100"; // account 201

    fn player(id: &str, kills: u32, deaths: u32, weapon: &str) -> PlayerMatchStats {
        let mut stats = PlayerMatchStats::new(id);
        stats.observe_name(id);
        for _ in 0..kills {
            stats.record_kill(weapon);
        }
        for _ in 0..deaths {
            stats.record_death();
        }
        stats
    }

    fn aggregated(started_at: i64, won: bool, players: Vec<PlayerMatchStats>) -> AggregatedMatch {
        let mut record = MatchRecord::new("10.0.0.1");
        record.started_at = started_at;
        record.map = "Town".to_string();
        record.duration_seconds = 600;
        record.won = won;

        AggregatedMatch {
            record,
            players: players
                .into_iter()
                .map(|p| (p.user_id.clone(), p))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn test_default_rules_cover_catalogue_in_order() {
        let kinds: Vec<_> = default_rules().iter().map(|rule| rule.kind()).collect();
        assert_eq!(kinds, MedalKind::ALL.to_vec());
    }

    #[test]
    fn test_leaderboard_award_then_transfer() {
        let store = SqliteStore::open_in_memory().unwrap();
        let rule = LeaderboardRule::new(MedalKind::MostKillsCurrent, LeaderboardMetric::Kills);

        store.persist_match(&aggregated(100, false, vec![player(ALICE, 10, 1, "weapon_m4a1")])).unwrap();
        assert_eq!(
            rule.evaluate(&store, 0).unwrap(),
            RuleOutcome::HolderAwarded(MetricValue::new(200, 10))
        );

        store.persist_match(&aggregated(200, false, vec![player(BOB, 15, 1, "weapon_m4a1")])).unwrap();
        assert_eq!(
            rule.evaluate(&store, 0).unwrap(),
            RuleOutcome::HolderTransferred {
                previous: 200,
                next: MetricValue::new(201, 15)
            }
        );

        let holder = store.current_holder(MedalKind::MostKillsCurrent).unwrap().unwrap();
        assert_eq!(holder.user_id, 201);
        assert_eq!(holder.value, 15);

        // Unchanged data: nothing to do
        assert_eq!(rule.evaluate(&store, 0).unwrap(), RuleOutcome::Unchanged);
    }

    #[test]
    fn test_leaderboard_tie_keeps_holder() {
        let store = SqliteStore::open_in_memory().unwrap();
        let rule = LeaderboardRule::new(MedalKind::MostKillsCurrent, LeaderboardMetric::Kills);

        store.persist_match(&aggregated(100, false, vec![player(BOB, 10, 1, "weapon_m4a1")])).unwrap();
        rule.evaluate(&store, 0).unwrap();

        // Alice ties with a lower account id and ranks first, but a tie never transfers
        store.persist_match(&aggregated(200, false, vec![player(ALICE, 10, 1, "weapon_m4a1")])).unwrap();
        assert_eq!(rule.evaluate(&store, 0).unwrap(), RuleOutcome::Unchanged);
        assert_eq!(store.current_holder(MedalKind::MostKillsCurrent).unwrap().unwrap().user_id, 201);
    }

    #[test]
    fn test_leaderboard_holder_value_raised() {
        let store = SqliteStore::open_in_memory().unwrap();
        let rule = LeaderboardRule::new(MedalKind::MostKillsCurrent, LeaderboardMetric::Kills);

        store.persist_match(&aggregated(100, false, vec![player(ALICE, 10, 1, "weapon_m4a1")])).unwrap();
        rule.evaluate(&store, 0).unwrap();
        store.persist_match(&aggregated(200, false, vec![player(ALICE, 4, 1, "weapon_m4a1")])).unwrap();

        assert_eq!(
            rule.evaluate(&store, 0).unwrap(),
            RuleOutcome::HolderValueUpdated(MetricValue::new(200, 14))
        );
    }

    #[test]
    fn test_leaderboard_no_data() {
        let store = SqliteStore::open_in_memory().unwrap();
        let rule = LeaderboardRule::new(MedalKind::HighestKdCurrent, LeaderboardMetric::KdHundredths);
        assert_eq!(rule.evaluate(&store, 0).unwrap(), RuleOutcome::NoData);
    }

    #[test]
    fn test_threshold_grants_once() {
        let store = SqliteStore::open_in_memory().unwrap();
        let rule = ThresholdRule::new(MedalKind::IWon, ThresholdMetric::MatchesWon, 3);

        for started_at in [100, 200] {
            store.persist_match(&aggregated(started_at, true, vec![player(ALICE, 1, 0, "weapon_m9")])).unwrap();
        }
        assert_eq!(rule.evaluate(&store, 0).unwrap(), RuleOutcome::NoData);

        store.persist_match(&aggregated(300, true, vec![player(ALICE, 1, 0, "weapon_m9")])).unwrap();
        assert_eq!(
            rule.evaluate(&store, 0).unwrap(),
            RuleOutcome::Granted(vec![MetricValue::new(200, 3)])
        );

        store.persist_match(&aggregated(400, true, vec![player(ALICE, 1, 0, "weapon_m9")])).unwrap();
        assert_eq!(rule.evaluate(&store, 0).unwrap(), RuleOutcome::NoData);
        assert_eq!(store.medals_of_kind(MedalKind::IWon).unwrap().len(), 1);
    }

    #[test]
    fn test_weapon_category_rule() {
        let rule = ThresholdRule::weapon_category(WEAPON_CATEGORIES[0]);
        assert_eq!(rule.kind(), MedalKind::KnifeExpert);
        assert_eq!(rule.threshold(), 100);
        match rule.metric() {
            ThresholdMetric::WeaponKills(weapons) => assert!(weapons.contains(&"weapon_kabar".to_string())),
            other => panic!("unexpected metric {other:?}"),
        }
    }
}
