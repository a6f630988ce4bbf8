//! Medal types

use serde::{Deserialize, Serialize};

/// Medal kinds with their persisted ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MedalKind {
    MostKillsCurrent = 1,
    HighestKdCurrent = 2,
    IWon = 3,
    ImOnAStreak = 4,
    TopFragger = 5,
    GoodTeammate = 6,
    KnifeExpert = 7,
    PistolExpert = 8,
    AkExpert = 9,
    RifleExpert = 10,
    ExplosivesExpert = 11,
    OneManArmy = 12,
    DieHard = 13,
    SixMonths = 14,
    OneYear = 15,
    TwoYears = 16,
    ThreeYears = 17,
    FourYears = 18,
}

impl MedalKind {
    /// Every kind, in evaluation order
    pub const ALL: [MedalKind; 18] = [
        MedalKind::MostKillsCurrent,
        MedalKind::HighestKdCurrent,
        MedalKind::IWon,
        MedalKind::ImOnAStreak,
        MedalKind::TopFragger,
        MedalKind::GoodTeammate,
        MedalKind::KnifeExpert,
        MedalKind::PistolExpert,
        MedalKind::AkExpert,
        MedalKind::RifleExpert,
        MedalKind::ExplosivesExpert,
        MedalKind::OneManArmy,
        MedalKind::DieHard,
        MedalKind::SixMonths,
        MedalKind::OneYear,
        MedalKind::TwoYears,
        MedalKind::ThreeYears,
        MedalKind::FourYears,
    ];

    /// Value stored in `user_medals.medal_id`
    pub fn id(self) -> i64 {
        self as i64
    }

    pub fn from_id(id: i64) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.id() == id)
    }

    /// Leaderboard kinds have a single current holder
    pub fn is_leaderboard(self) -> bool {
        matches!(self, MedalKind::MostKillsCurrent | MedalKind::HighestKdCurrent)
    }
}

impl std::fmt::Display for MedalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MedalKind::MostKillsCurrent => "most_kills_current",
            MedalKind::HighestKdCurrent => "highest_kd_current",
            MedalKind::IWon => "i_won",
            MedalKind::ImOnAStreak => "im_on_a_streak",
            MedalKind::TopFragger => "top_fragger",
            MedalKind::GoodTeammate => "good_teammate",
            MedalKind::KnifeExpert => "knife_expert",
            MedalKind::PistolExpert => "pistol_expert",
            MedalKind::AkExpert => "ak_expert",
            MedalKind::RifleExpert => "rifle_expert",
            MedalKind::ExplosivesExpert => "explosives_expert",
            MedalKind::OneManArmy => "one_man_army",
            MedalKind::DieHard => "die_hard",
            MedalKind::SixMonths => "six_months",
            MedalKind::OneYear => "one_year",
            MedalKind::TwoYears => "two_years",
            MedalKind::ThreeYears => "three_years",
            MedalKind::FourYears => "four_years",
        };
        write!(f, "{}", name)
    }
}

/// A medal held by a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedalRecord {
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub kind: MedalKind,
    pub value: i64,
    /// Only meaningful for leaderboard kinds
    #[serde(rename = "isCurrentHolder")]
    pub is_current_holder: bool,
}

/// A user paired with the value of some metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricValue {
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub value: i64,
}

impl MetricValue {
    pub fn new(user_id: i64, value: i64) -> Self {
        Self { user_id, value }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_stable() {
        assert_eq!(MedalKind::MostKillsCurrent.id(), 1);
        assert_eq!(MedalKind::ExplosivesExpert.id(), 11);
        assert_eq!(MedalKind::FourYears.id(), 18);
    }

    #[test]
    fn test_from_id() {
        for kind in MedalKind::ALL {
            assert_eq!(MedalKind::from_id(kind.id()), Some(kind));
        }
        assert_eq!(MedalKind::from_id(0), None);
        assert_eq!(MedalKind::from_id(19), None);
    }

    #[test]
    fn test_leaderboard_kinds() {
        let leaderboards: Vec<_> = MedalKind::ALL
            .iter()
            .filter(|k| k.is_leaderboard())
            .collect();
        assert_eq!(leaderboards.len(), 2);
    }
}
