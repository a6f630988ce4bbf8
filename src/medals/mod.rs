//! Medal Rule Engine
//!
//! Evaluates an ordered list of medal rules against the aggregate tables
//! after every aggregation sweep. Every rule is idempotent, so a failed
//! sweep is simply retried from scratch by the next one.

pub mod rules;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::StatsResult;
use crate::store::MedalStore;
use crate::types::{MedalKind, MetricValue};

pub use rules::{default_rules, LeaderboardRule, ThresholdRule, WeaponCategory, WEAPON_CATEGORIES};

/// What a single rule evaluation changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleOutcome {
    /// The leading query returned nothing yet
    NoData,
    Unchanged,
    HolderAwarded(MetricValue),
    HolderValueUpdated(MetricValue),
    HolderTransferred { previous: i64, next: MetricValue },
    Granted(Vec<MetricValue>),
}

/// Trait for medal rules
///
/// Each rule owns one medal kind and must be safe to evaluate any number
/// of times against unchanged data.
pub trait MedalRule: Send + Sync {
    /// Get the name of this rule
    fn name(&self) -> &str;

    /// Medal kind written by this rule
    fn kind(&self) -> MedalKind;

    /// Evaluate the rule
    ///
    /// # Arguments
    /// * `store` - Aggregate reads and medal writes
    /// * `as_of` - Sweep time in canonical epoch seconds
    fn evaluate(&self, store: &dyn MedalStore, as_of: i64) -> StatsResult<RuleOutcome>;
}

/// Statistics about one medal sweep
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedalSweepStats {
    #[serde(rename = "rulesEvaluated")]
    pub rules_evaluated: usize,
    #[serde(rename = "holdersAwarded")]
    pub holders_awarded: usize,
    #[serde(rename = "holdersTransferred")]
    pub holders_transferred: usize,
    #[serde(rename = "valuesUpdated")]
    pub values_updated: usize,
    #[serde(rename = "medalsGranted")]
    pub medals_granted: usize,
    #[serde(rename = "executionTimeMs")]
    pub execution_time_ms: u64,
}

impl MedalSweepStats {
    /// Whether any medal row was written
    pub fn has_changes(&self) -> bool {
        self.holders_awarded + self.holders_transferred + self.values_updated + self.medals_granted > 0
    }

    fn record(&mut self, outcome: &RuleOutcome) {
        self.rules_evaluated += 1;
        match outcome {
            RuleOutcome::NoData | RuleOutcome::Unchanged => {}
            RuleOutcome::HolderAwarded(_) => self.holders_awarded += 1,
            RuleOutcome::HolderValueUpdated(_) => self.values_updated += 1,
            RuleOutcome::HolderTransferred { .. } => self.holders_transferred += 1,
            RuleOutcome::Granted(grants) => self.medals_granted += grants.len(),
        }
    }
}

/// The medal engine that manages and applies rules
pub struct MedalEngine {
    rules: Vec<Box<dyn MedalRule>>,
}

impl MedalEngine {
    /// Create an engine with the full medal catalogue
    pub fn new() -> Self {
        Self {
            rules: default_rules(),
        }
    }

    /// Create an empty engine (no rules)
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Register a new rule; rules run in registration order
    pub fn register_rule(&mut self, rule: Box<dyn MedalRule>) {
        self.rules.push(rule);
    }

    /// Get the number of registered rules
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Run every rule once. The first failing rule aborts the sweep.
    pub fn run(&self, store: &dyn MedalStore, as_of: i64) -> StatsResult<MedalSweepStats> {
        let mut stats = MedalSweepStats::default();
        let start_time = std::time::Instant::now();

        for rule in &self.rules {
            let outcome = rule.evaluate(store, as_of)?;
            debug!(rule = rule.name(), ?outcome, "rule evaluated");
            match &outcome {
                RuleOutcome::NoData | RuleOutcome::Unchanged => {}
                RuleOutcome::HolderAwarded(holder) => {
                    info!(medal = %rule.kind(), user = holder.user_id, value = holder.value, "medal holder awarded");
                }
                RuleOutcome::HolderValueUpdated(holder) => {
                    info!(medal = %rule.kind(), user = holder.user_id, value = holder.value, "medal value raised");
                }
                RuleOutcome::HolderTransferred { previous, next } => {
                    info!(
                        medal = %rule.kind(),
                        from = previous,
                        to = next.user_id,
                        value = next.value,
                        "medal holder changed"
                    );
                }
                RuleOutcome::Granted(grants) => {
                    for grant in grants {
                        info!(medal = %rule.kind(), user = grant.user_id, value = grant.value, "medal granted");
                    }
                }
            }
            stats.record(&outcome);
        }

        stats.execution_time_ms = start_time.elapsed().as_millis() as u64;
        Ok(stats)
    }
}

impl Default for MedalEngine {
    fn default() -> Self {
        Self::new()
    }
}
