//! Tracked entity model
//!
//! An entity is a tracked celebrity/subject with a stable id, a set of
//! searchable aliases, and a longitudinal drama temperature. Temperature
//! is always bounded to [0, 100] and the status tier is derived from it,
//! never stored independently.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lower bound of the temperature scale
pub const TEMPERATURE_MIN: f64 = 0.0;
/// Upper bound of the temperature scale
pub const TEMPERATURE_MAX: f64 = 100.0;

/// Days a memorial entity is kept before retirement (18 months)
pub const MEMORIAL_RETENTION_DAYS: i64 = 548;

/// Days a newly discovered entity stays in the `new` state before
/// promotion to `active`
pub const NEW_ENTITY_PROMOTION_DAYS: i64 = 30;

/// Status tier derived from the current temperature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityStatus {
    Explosive,
    Hot,
    Rising,
    Mild,
    Cooling,
    Freezing,
}

impl EntityStatus {
    /// Derive the status tier from a temperature.
    ///
    /// Fixed thresholds over the full 0-100 range: >=85 explosive,
    /// >=70 hot, >=50 rising, >=30 mild, >=10 cooling, else freezing.
    pub fn from_temperature(temperature: f64) -> Self {
        if temperature >= 85.0 {
            EntityStatus::Explosive
        } else if temperature >= 70.0 {
            EntityStatus::Hot
        } else if temperature >= 50.0 {
            EntityStatus::Rising
        } else if temperature >= 30.0 {
            EntityStatus::Mild
        } else if temperature >= 10.0 {
            EntityStatus::Cooling
        } else {
            EntityStatus::Freezing
        }
    }

    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "explosive" => Some(EntityStatus::Explosive),
            "hot" => Some(EntityStatus::Hot),
            "rising" => Some(EntityStatus::Rising),
            "mild" => Some(EntityStatus::Mild),
            "cooling" => Some(EntityStatus::Cooling),
            "freezing" => Some(EntityStatus::Freezing),
            _ => None,
        }
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityStatus::Explosive => "explosive",
            EntityStatus::Hot => "hot",
            EntityStatus::Rising => "rising",
            EntityStatus::Mild => "mild",
            EntityStatus::Cooling => "cooling",
            EntityStatus::Freezing => "freezing",
        }
    }
}

impl std::fmt::Display for EntityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle state of a tracked entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    /// Normal tracked entity, scored every run
    Active,
    /// Recently discovered, scored but flagged until promotion
    New,
    /// Deceased: temperature frozen, excluded from scoring
    Memorial,
    /// Memorial past retention: temperature forced to 0, never scored
    Retired,
}

impl LifecycleState {
    /// Whether the entity participates in mention extraction and scoring
    pub fn is_scorable(&self) -> bool {
        matches!(self, LifecycleState::Active | LifecycleState::New)
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Active => "active",
            LifecycleState::New => "new",
            LifecycleState::Memorial => "memorial",
            LifecycleState::Retired => "retired",
        }
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A tracked celebrity/subject
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// Stable key: normalized lowercase with underscore separators
    /// (e.g. "taylor_swift")
    pub id: String,
    /// Canonical display name (e.g. "Taylor Swift")
    pub name: String,
    /// Alternate surface forms matched in text (nicknames, full names)
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Current drama temperature in [0, 100]
    #[serde(default)]
    pub temperature: f64,
    /// Temperature before the most recent update (for delta reporting)
    #[serde(default)]
    pub previous_temperature: f64,
    /// Tier derived from `temperature`
    #[serde(default = "default_status")]
    pub status: EntityStatus,
    /// Lifecycle state
    #[serde(default = "default_lifecycle")]
    pub lifecycle_state: LifecycleState,
    /// When the entity entered the memorial state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memorial_since: Option<DateTime<Utc>>,
    /// When the entity was added to the roster (set for discovered entities)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added_at: Option<DateTime<Utc>>,
}

fn default_status() -> EntityStatus {
    EntityStatus::Freezing
}

fn default_lifecycle() -> LifecycleState {
    LifecycleState::Active
}

impl Entity {
    /// Create a new active entity with zero temperature
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            aliases: Vec::new(),
            temperature: 0.0,
            previous_temperature: 0.0,
            status: EntityStatus::Freezing,
            lifecycle_state: LifecycleState::Active,
            memorial_since: None,
            added_at: None,
        }
    }

    /// Record a new temperature: stashes the old value, clamps to
    /// [0, 100], and rederives the status tier.
    pub fn record_temperature(&mut self, temperature: f64) {
        self.previous_temperature = self.temperature;
        self.temperature = temperature.clamp(TEMPERATURE_MIN, TEMPERATURE_MAX);
        self.status = EntityStatus::from_temperature(self.temperature);
    }

    /// Delta of the most recent update (new - old)
    pub fn temperature_change(&self) -> f64 {
        self.temperature - self.previous_temperature
    }

    /// Whether this entity participates in mention extraction and scoring
    pub fn is_scorable(&self) -> bool {
        self.lifecycle_state.is_scorable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_boundaries() {
        assert_eq!(EntityStatus::from_temperature(100.0), EntityStatus::Explosive);
        assert_eq!(EntityStatus::from_temperature(85.0), EntityStatus::Explosive);
        assert_eq!(EntityStatus::from_temperature(84.9), EntityStatus::Hot);
        assert_eq!(EntityStatus::from_temperature(70.0), EntityStatus::Hot);
        assert_eq!(EntityStatus::from_temperature(69.9), EntityStatus::Rising);
        assert_eq!(EntityStatus::from_temperature(50.0), EntityStatus::Rising);
        assert_eq!(EntityStatus::from_temperature(49.9), EntityStatus::Mild);
        assert_eq!(EntityStatus::from_temperature(30.0), EntityStatus::Mild);
        assert_eq!(EntityStatus::from_temperature(29.9), EntityStatus::Cooling);
        assert_eq!(EntityStatus::from_temperature(10.0), EntityStatus::Cooling);
        assert_eq!(EntityStatus::from_temperature(9.9), EntityStatus::Freezing);
        assert_eq!(EntityStatus::from_temperature(0.0), EntityStatus::Freezing);
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            EntityStatus::Explosive,
            EntityStatus::Hot,
            EntityStatus::Rising,
            EntityStatus::Mild,
            EntityStatus::Cooling,
            EntityStatus::Freezing,
        ] {
            assert_eq!(EntityStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(EntityStatus::from_str("nuclear"), None);
    }

    #[test]
    fn test_record_temperature_clamps_and_stashes() {
        let mut entity = Entity::new("taylor_swift", "Taylor Swift");
        entity.record_temperature(150.0);
        assert_eq!(entity.temperature, 100.0);
        assert_eq!(entity.previous_temperature, 0.0);
        assert_eq!(entity.status, EntityStatus::Explosive);

        entity.record_temperature(-5.0);
        assert_eq!(entity.temperature, 0.0);
        assert_eq!(entity.previous_temperature, 100.0);
        assert_eq!(entity.temperature_change(), -100.0);
        assert_eq!(entity.status, EntityStatus::Freezing);
    }

    #[test]
    fn test_lifecycle_scorable() {
        assert!(LifecycleState::Active.is_scorable());
        assert!(LifecycleState::New.is_scorable());
        assert!(!LifecycleState::Memorial.is_scorable());
        assert!(!LifecycleState::Retired.is_scorable());
    }
}
