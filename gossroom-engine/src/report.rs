//! Execution reporting
//!
//! Each run produces a persisted summary: what every step did, how long
//! it took, and the counts that matter when judging whether a run was
//! healthy. The temperature report is the roster-movement snapshot shown
//! by the status command.

use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use gossroom_core::{Entity, EntityStatus};

/// Entities listed in the hottest section of the report
const REPORT_HOTTEST: usize = 10;
/// Entities listed in each movement section
const REPORT_MOVERS: usize = 5;

/// Outcome of one pipeline step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepOutcome {
    Ok,
    Failed,
    Skipped,
}

/// One timed pipeline step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepReport {
    pub name: String,
    pub outcome: StepOutcome,
    pub duration_ms: u64,
    /// Error text for failed steps
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl StepReport {
    pub fn ok(name: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            name: name.into(),
            outcome: StepOutcome::Ok,
            duration_ms,
            detail: None,
        }
    }

    pub fn failed(name: impl Into<String>, duration_ms: u64, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            outcome: StepOutcome::Failed,
            duration_ms,
            detail: Some(detail.into()),
        }
    }

    pub fn skipped(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            outcome: StepOutcome::Skipped,
            duration_ms: 0,
            detail: Some(detail.into()),
        }
    }
}

/// Counts accumulated across one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounts {
    pub sources_ok: usize,
    pub sources_failed: usize,
    pub articles_fetched: usize,
    pub parse_failures: usize,
    pub previously_seen: usize,
    pub articles_accepted: usize,
    pub articles_rejected: usize,
    pub duplicates_removed: usize,
    pub entities_updated: usize,
    pub candidates_promoted: usize,
    pub posts_written: usize,
    pub republished: usize,
}

/// Persisted per-run execution summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub steps: Vec<StepReport>,
    pub counts: RunCounts,
}

impl RunSummary {
    /// Fraction of executed steps that succeeded. Skipped steps do not
    /// count against the rate; a run with nothing executed scores 1.0.
    pub fn success_rate(&self) -> f64 {
        let executed = self
            .steps
            .iter()
            .filter(|s| s.outcome != StepOutcome::Skipped)
            .count();
        if executed == 0 {
            return 1.0;
        }
        let ok = self
            .steps
            .iter()
            .filter(|s| s.outcome == StepOutcome::Ok)
            .count();
        ok as f64 / executed as f64
    }

    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }

    pub fn failed_steps(&self) -> impl Iterator<Item = &StepReport> {
        self.steps
            .iter()
            .filter(|s| s.outcome == StepOutcome::Failed)
    }
}

/// One entity in the movement report
#[derive(Debug, Clone, Serialize)]
pub struct EntitySnapshot {
    pub id: String,
    pub name: String,
    pub temperature: f64,
    pub change: f64,
    pub status: EntityStatus,
}

impl EntitySnapshot {
    fn from_entity(entity: &Entity) -> Self {
        Self {
            id: entity.id.clone(),
            name: entity.name.clone(),
            temperature: entity.temperature,
            change: entity.temperature_change(),
            status: entity.status,
        }
    }
}

/// Roster movement snapshot over the scorable entities
#[derive(Debug, Clone, Serialize)]
pub struct TemperatureReport {
    /// Entity count per status tier, hottest tier first
    pub tier_counts: Vec<(EntityStatus, usize)>,
    pub hottest: Vec<EntitySnapshot>,
    pub biggest_risers: Vec<EntitySnapshot>,
    pub biggest_fallers: Vec<EntitySnapshot>,
}

impl TemperatureReport {
    pub fn from_roster(roster: &[Entity]) -> Self {
        let scorable: Vec<&Entity> = roster.iter().filter(|e| e.is_scorable()).collect();

        let tier_counts = [
            EntityStatus::Explosive,
            EntityStatus::Hot,
            EntityStatus::Rising,
            EntityStatus::Mild,
            EntityStatus::Cooling,
            EntityStatus::Freezing,
        ]
        .into_iter()
        .map(|status| {
            let count = scorable.iter().filter(|e| e.status == status).count();
            (status, count)
        })
        .collect();

        let hottest = scorable
            .iter()
            .sorted_by(|a, b| b.temperature.total_cmp(&a.temperature))
            .take(REPORT_HOTTEST)
            .map(|e| EntitySnapshot::from_entity(e))
            .collect();

        let biggest_risers = scorable
            .iter()
            .filter(|e| e.temperature_change() > 0.0)
            .sorted_by(|a, b| b.temperature_change().total_cmp(&a.temperature_change()))
            .take(REPORT_MOVERS)
            .map(|e| EntitySnapshot::from_entity(e))
            .collect();

        let biggest_fallers = scorable
            .iter()
            .filter(|e| e.temperature_change() < 0.0)
            .sorted_by(|a, b| a.temperature_change().total_cmp(&b.temperature_change()))
            .take(REPORT_MOVERS)
            .map(|e| EntitySnapshot::from_entity(e))
            .collect();

        Self {
            tier_counts,
            hottest,
            biggest_risers,
            biggest_fallers,
        }
    }
}
