//! Drama temperature scoring
//!
//! Raw score per entity is a weighted composite over its 30-day mention
//! history:
//!   recency_activity  = sum(count * exp(-days_ago / 7))
//!   frequency_bonus   = min(50, total_mentions * 5)
//!   velocity_term     = clamp(ratio, -1, 3) * 20 * 1.5
//!   consistency_term  = 1 / (1 + stdev(gaps) / 7) * 15
//!
//! Raw scores are then mapped onto the 0-100 temperature scale by
//! population percentile cut points (p25/p50/p70/p85/p95 over non-zero
//! raw scores), linearly interpolated within each band. Temperature is
//! relative: the same mention count lands differently depending on how
//! loud the whole week was.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use gossroom_core::Entity;

/// Days of mention history considered per entity
pub const LOOKBACK_DAYS: i64 = 30;

/// Decay constant for recency weighting, in days
const DECAY_HALF_LIFE_DAYS: f64 = 7.0;

/// Frequency bonus per mention, saturating at the cap
const FREQUENCY_PER_MENTION: f64 = 5.0;
const FREQUENCY_CAP: f64 = 50.0;

/// Recent window compared against the rest of the lookback for velocity
const VELOCITY_RECENT_DAYS: i64 = 14;
/// The velocity ratio is clamped before scaling so one quiet-then-loud
/// entity cannot blow out the scale
const VELOCITY_RATIO_MIN: f64 = -1.0;
const VELOCITY_RATIO_MAX: f64 = 3.0;
const VELOCITY_SCALE: f64 = 20.0;
const VELOCITY_WEIGHT: f64 = 1.5;

/// Gap dispersion is normalized to a week before inverting
const CONSISTENCY_GAP_NORM_DAYS: f64 = 7.0;
const CONSISTENCY_SCALE: f64 = 15.0;

/// One day of aggregated weighted mentions for an entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentionRecord {
    pub date: DateTime<Utc>,
    /// Weighted mention count accumulated that day
    pub count: f64,
}

/// All computed components feeding one entity's raw score
#[derive(Debug, Clone, Default)]
pub struct ScoreComponents {
    pub recency_activity: f64,
    pub frequency_bonus: f64,
    pub velocity_term: f64,
    pub consistency_term: f64,
    pub raw_score: f64,
}

/// Compute the raw composite score from an entity's mention history.
/// Records outside the lookback window are ignored.
pub fn compute_raw_score(history: &[MentionRecord], now: DateTime<Utc>) -> ScoreComponents {
    let in_window: Vec<(&MentionRecord, i64)> = history
        .iter()
        .filter_map(|record| {
            let days_ago = (now - record.date).num_days();
            ((0..=LOOKBACK_DAYS).contains(&days_ago)).then_some((record, days_ago))
        })
        .collect();

    if in_window.is_empty() {
        return ScoreComponents::default();
    }

    let total_mentions: f64 = in_window.iter().map(|(r, _)| r.count).sum();

    let recency_activity: f64 = in_window
        .iter()
        .map(|(r, days_ago)| r.count * (-(*days_ago as f64) / DECAY_HALF_LIFE_DAYS).exp())
        .sum();

    let frequency_bonus = (total_mentions * FREQUENCY_PER_MENTION).min(FREQUENCY_CAP);

    let velocity_term = velocity_ratio(&in_window) * VELOCITY_SCALE * VELOCITY_WEIGHT;

    let consistency_term = consistency(&in_window) * CONSISTENCY_SCALE;

    let raw_score =
        (recency_activity + frequency_bonus + velocity_term + consistency_term).max(0.0);

    ScoreComponents {
        recency_activity,
        frequency_bonus,
        velocity_term,
        consistency_term,
        raw_score,
    }
}

/// Mean daily activity in the recent window versus the rest of the
/// lookback, expressed as a bounded ratio. Positive when trending up.
fn velocity_ratio(in_window: &[(&MentionRecord, i64)]) -> f64 {
    let recent_total: f64 = in_window
        .iter()
        .filter(|(_, days_ago)| *days_ago < VELOCITY_RECENT_DAYS)
        .map(|(r, _)| r.count)
        .sum();
    let older_total: f64 = in_window
        .iter()
        .filter(|(_, days_ago)| *days_ago >= VELOCITY_RECENT_DAYS)
        .map(|(r, _)| r.count)
        .sum();

    let recent_mean = recent_total / VELOCITY_RECENT_DAYS as f64;
    let older_mean = older_total / (LOOKBACK_DAYS - VELOCITY_RECENT_DAYS) as f64;

    let ratio = if older_mean > 0.0 {
        (recent_mean - older_mean) / older_mean
    } else if recent_mean > 0.0 {
        1.0
    } else {
        0.0
    };
    ratio.clamp(VELOCITY_RATIO_MIN, VELOCITY_RATIO_MAX)
}

/// Inverse dispersion of inter-mention day gaps, in (0, 1]. An entity
/// mentioned on fewer than two distinct days scores 0.
fn consistency(in_window: &[(&MentionRecord, i64)]) -> f64 {
    let mut days: Vec<i64> = in_window.iter().map(|(_, days_ago)| *days_ago).collect();
    days.sort_unstable();
    days.dedup();
    if days.len() < 2 {
        return 0.0;
    }

    let gaps: Vec<f64> = days.windows(2).map(|w| (w[1] - w[0]) as f64).collect();
    let stdev = sample_stdev(&gaps);
    1.0 / (1.0 + stdev / CONSISTENCY_GAP_NORM_DAYS)
}

/// Sample standard deviation; 0 for fewer than two values
fn sample_stdev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values
        .iter()
        .map(|v| (v - mean).powi(2))
        .sum::<f64>()
        / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Percentile cut points over the run's non-zero raw scores
#[derive(Debug, Clone, PartialEq)]
pub struct PercentileCuts {
    pub p25: f64,
    pub p50: f64,
    pub p70: f64,
    pub p85: f64,
    pub p95: f64,
}

/// Compute cut points from the non-zero raw scores of the current run.
/// Returns `None` when nothing scored above zero.
pub fn percentile_cuts(raw_scores: &[f64]) -> Option<PercentileCuts> {
    let mut nonzero: Vec<f64> = raw_scores.iter().copied().filter(|s| *s > 0.0).collect();
    if nonzero.is_empty() {
        return None;
    }
    nonzero.sort_by(f64::total_cmp);

    Some(PercentileCuts {
        p25: percentile_value(&nonzero, 25.0),
        p50: percentile_value(&nonzero, 50.0),
        p70: percentile_value(&nonzero, 70.0),
        p85: percentile_value(&nonzero, 85.0),
        p95: percentile_value(&nonzero, 95.0),
    })
}

/// Linearly interpolated percentile over a sorted slice
fn percentile_value(sorted: &[f64], percentile: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let index = (percentile / 100.0) * (sorted.len() - 1) as f64;
    let lower = index.floor() as usize;
    let upper = (lower + 1).min(sorted.len() - 1);
    let weight = index - lower as f64;
    sorted[lower] * (1.0 - weight) + sorted[upper] * weight
}

/// Map a raw score into the 0-100 temperature scale by linear
/// interpolation within its percentile band.
pub fn temperature_from_raw(raw: f64, cuts: &PercentileCuts) -> f64 {
    let temperature = if raw >= cuts.p95 {
        100.0
    } else if raw >= cuts.p85 {
        band(raw, cuts.p85, cuts.p95, 70.0, 100.0)
    } else if raw >= cuts.p70 {
        band(raw, cuts.p70, cuts.p85, 50.0, 70.0)
    } else if raw >= cuts.p50 {
        band(raw, cuts.p50, cuts.p70, 30.0, 50.0)
    } else if raw >= cuts.p25 {
        band(raw, cuts.p25, cuts.p50, 10.0, 30.0)
    } else if cuts.p25 > 0.0 {
        10.0 * raw / cuts.p25
    } else {
        0.0
    };
    temperature.clamp(0.0, 100.0)
}

fn band(raw: f64, lo: f64, hi: f64, temp_lo: f64, temp_hi: f64) -> f64 {
    let width = hi - lo;
    if width <= f64::EPSILON {
        return temp_hi;
    }
    temp_lo + (temp_hi - temp_lo) * (raw - lo) / width
}

/// Score every scorable entity in the roster against its mention
/// history. Memorial and retired entities are untouched. Returns the
/// number of entities updated.
pub fn score_roster(
    roster: &mut [Entity],
    histories: &IndexMap<String, Vec<MentionRecord>>,
    now: DateTime<Utc>,
) -> usize {
    let empty: Vec<MentionRecord> = Vec::new();

    let raw_scores: HashMap<String, f64> = roster
        .iter()
        .filter(|e| e.is_scorable())
        .map(|entity| {
            let history = histories.get(&entity.id).unwrap_or(&empty);
            let components = compute_raw_score(history, now);
            debug!(
                "Raw score for {}: {:.2} (recency {:.2}, freq {:.2}, velocity {:.2}, consistency {:.2})",
                entity.id,
                components.raw_score,
                components.recency_activity,
                components.frequency_bonus,
                components.velocity_term,
                components.consistency_term
            );
            (entity.id.clone(), components.raw_score)
        })
        .collect();

    let all_raws: Vec<f64> = raw_scores.values().copied().collect();
    let cuts = percentile_cuts(&all_raws);

    let mut updated = 0usize;
    for entity in roster.iter_mut().filter(|e| e.is_scorable()) {
        let raw = raw_scores.get(&entity.id).copied().unwrap_or(0.0);
        let temperature = match (&cuts, raw > 0.0) {
            (Some(cuts), true) => round_tenth(temperature_from_raw(raw, cuts)),
            _ => 0.0,
        };
        entity.record_temperature(temperature);
        updated += 1;
    }

    info!("Scored {} entities", updated);
    updated
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use gossroom_core::{EntityStatus, LifecycleState};

    fn record(days_ago: i64, count: f64, now: DateTime<Utc>) -> MentionRecord {
        MentionRecord {
            date: now - Duration::days(days_ago),
            count,
        }
    }

    #[test]
    fn test_raw_score_empty_history() {
        let components = compute_raw_score(&[], Utc::now());
        assert_eq!(components.raw_score, 0.0);
    }

    #[test]
    fn test_recency_decay_formula() {
        let now = Utc::now();
        let history = vec![record(7, 8.0, now)];
        let components = compute_raw_score(&history, now);
        let expected = 8.0 * (-1.0f64).exp();
        assert!((components.recency_activity - expected).abs() < 1e-9);
    }

    #[test]
    fn test_records_outside_lookback_ignored() {
        let now = Utc::now();
        let history = vec![record(31, 50.0, now)];
        let components = compute_raw_score(&history, now);
        assert_eq!(components.raw_score, 0.0);
    }

    #[test]
    fn test_frequency_bonus_saturates() {
        let now = Utc::now();
        let history = vec![record(1, 20.0, now)];
        let components = compute_raw_score(&history, now);
        assert_eq!(components.frequency_bonus, FREQUENCY_CAP);
    }

    #[test]
    fn test_velocity_positive_when_trending_up() {
        let now = Utc::now();
        let history = vec![record(2, 10.0, now), record(20, 1.0, now)];
        let components = compute_raw_score(&history, now);
        assert!(components.velocity_term > 0.0);
    }

    #[test]
    fn test_velocity_negative_when_cooling_off() {
        let now = Utc::now();
        let history = vec![record(2, 1.0, now), record(20, 20.0, now)];
        let components = compute_raw_score(&history, now);
        assert!(components.velocity_term < 0.0);
    }

    #[test]
    fn test_velocity_bounded() {
        let now = Utc::now();
        // Massive recent spike over near-silent older window
        let history = vec![record(1, 500.0, now), record(20, 0.1, now)];
        let components = compute_raw_score(&history, now);
        let max_term = VELOCITY_RATIO_MAX * VELOCITY_SCALE * VELOCITY_WEIGHT;
        assert!(components.velocity_term <= max_term + 1e-9);
    }

    #[test]
    fn test_consistency_rewards_even_spread() {
        let now = Utc::now();
        let even = vec![
            record(3, 2.0, now),
            record(6, 2.0, now),
            record(9, 2.0, now),
            record(12, 2.0, now),
        ];
        let bursty = vec![
            record(1, 2.0, now),
            record(2, 2.0, now),
            record(3, 2.0, now),
            record(25, 2.0, now),
        ];
        let even_score = compute_raw_score(&even, now);
        let bursty_score = compute_raw_score(&bursty, now);
        assert!(even_score.consistency_term > bursty_score.consistency_term);
        // Perfectly even gaps have zero dispersion
        assert!((even_score.consistency_term - CONSISTENCY_SCALE).abs() < 1e-9);
    }

    #[test]
    fn test_single_day_history_no_consistency() {
        let now = Utc::now();
        let history = vec![record(2, 5.0, now)];
        let components = compute_raw_score(&history, now);
        assert_eq!(components.consistency_term, 0.0);
    }

    #[test]
    fn test_percentile_interpolation() {
        let sorted = vec![10.0, 20.0, 30.0, 40.0, 50.0];
        assert!((percentile_value(&sorted, 50.0) - 30.0).abs() < 1e-9);
        assert!((percentile_value(&sorted, 25.0) - 20.0).abs() < 1e-9);
        assert!((percentile_value(&sorted, 95.0) - 48.0).abs() < 1e-9);
    }

    #[test]
    fn test_percentile_cuts_ignore_zeros() {
        let cuts = percentile_cuts(&[0.0, 0.0, 10.0]).unwrap();
        assert_eq!(cuts.p25, 10.0);
        assert_eq!(cuts.p95, 10.0);
        assert!(percentile_cuts(&[0.0, 0.0]).is_none());
    }

    fn test_cuts() -> PercentileCuts {
        PercentileCuts {
            p25: 10.0,
            p50: 20.0,
            p70: 30.0,
            p85: 40.0,
            p95: 50.0,
        }
    }

    #[test]
    fn test_temperature_band_boundaries() {
        let cuts = test_cuts();
        assert_eq!(temperature_from_raw(50.0, &cuts), 100.0);
        assert_eq!(temperature_from_raw(45.0, &cuts), 85.0);
        assert_eq!(temperature_from_raw(40.0, &cuts), 70.0);
        assert_eq!(temperature_from_raw(35.0, &cuts), 60.0);
        assert_eq!(temperature_from_raw(30.0, &cuts), 50.0);
        assert_eq!(temperature_from_raw(20.0, &cuts), 30.0);
        assert_eq!(temperature_from_raw(10.0, &cuts), 10.0);
        assert_eq!(temperature_from_raw(5.0, &cuts), 5.0);
    }

    #[test]
    fn test_temperature_always_bounded() {
        let cuts = test_cuts();
        for raw in [0.0, 0.1, 9.9, 10.0, 33.3, 49.9, 50.0, 500.0] {
            let t = temperature_from_raw(raw, &cuts);
            assert!((0.0..=100.0).contains(&t), "raw {} gave {}", raw, t);
        }
    }

    fn scorable_entity(id: &str, temperature: f64) -> Entity {
        let mut entity = Entity::new(id, id);
        entity.temperature = temperature;
        entity.previous_temperature = temperature;
        entity.status = EntityStatus::from_temperature(temperature);
        entity
    }

    #[test]
    fn test_score_roster_idempotent() {
        let now = Utc::now();
        let mut roster = vec![
            scorable_entity("taylor_swift", 50.0),
            scorable_entity("drake", 20.0),
        ];
        let mut histories = IndexMap::new();
        histories.insert(
            "taylor_swift".to_string(),
            vec![record(1, 9.0, now), record(4, 6.0, now)],
        );
        histories.insert("drake".to_string(), vec![record(2, 3.0, now)]);

        score_roster(&mut roster, &histories, now);
        let first: Vec<f64> = roster.iter().map(|e| e.temperature).collect();

        score_roster(&mut roster, &histories, now);
        for (entity, previous) in roster.iter().zip(first) {
            assert_eq!(entity.temperature, previous);
            assert_eq!(entity.temperature_change(), 0.0);
        }
    }

    #[test]
    fn test_score_roster_zero_mentions_resets() {
        let now = Utc::now();
        let mut roster = vec![scorable_entity("quiet_star", 50.0)];
        score_roster(&mut roster, &IndexMap::new(), now);
        assert_eq!(roster[0].temperature, 0.0);
        assert_eq!(roster[0].status, EntityStatus::Freezing);
        assert_eq!(roster[0].temperature_change(), -50.0);
    }

    #[test]
    fn test_score_roster_memorial_untouched() {
        let now = Utc::now();
        let mut memorial = scorable_entity("legend", 42.0);
        memorial.lifecycle_state = LifecycleState::Memorial;
        let mut roster = vec![memorial];

        let mut histories = IndexMap::new();
        histories.insert("legend".to_string(), vec![record(1, 10.0, now)]);

        score_roster(&mut roster, &histories, now);
        assert_eq!(roster[0].temperature, 42.0);
        assert_eq!(roster[0].temperature_change(), 0.0);
    }

    #[test]
    fn test_score_roster_single_active_entity_tops_scale() {
        let now = Utc::now();
        let mut roster = vec![scorable_entity("only_star", 0.0)];
        let mut histories = IndexMap::new();
        histories.insert("only_star".to_string(), vec![record(1, 4.0, now)]);

        score_roster(&mut roster, &histories, now);
        assert_eq!(roster[0].temperature, 100.0);
    }

    #[test]
    fn test_score_roster_relative_population() {
        let now = Utc::now();
        let mut roster = vec![
            scorable_entity("loud", 0.0),
            scorable_entity("medium", 0.0),
            scorable_entity("faint", 0.0),
        ];
        let mut histories = IndexMap::new();
        histories.insert("loud".to_string(), vec![record(1, 30.0, now), record(3, 20.0, now)]);
        histories.insert("medium".to_string(), vec![record(2, 6.0, now)]);
        histories.insert("faint".to_string(), vec![record(10, 1.0, now)]);

        score_roster(&mut roster, &histories, now);
        let by_id: HashMap<&str, f64> = roster
            .iter()
            .map(|e| (e.id.as_str(), e.temperature))
            .collect();
        assert!(by_id["loud"] > by_id["medium"]);
        assert!(by_id["medium"] > by_id["faint"]);
        assert!(roster.iter().all(|e| (0.0..=100.0).contains(&e.temperature)));
    }
}
