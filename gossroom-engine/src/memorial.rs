//! Memorial retention pass
//!
//! Memorial entities sit outside scoring with their temperature frozen.
//! Once the retention window since `memorial_since` lapses they move to
//! retired and their temperature drops to 0 so they disappear from the
//! active tiers for good.

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use gossroom_core::{Entity, LifecycleState, MEMORIAL_RETENTION_DAYS};

/// Counts from one cleanup pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorialReport {
    pub memorial_kept: usize,
    pub retired_now: usize,
}

/// Retire memorial entities whose retention window has lapsed. Entities
/// in any other lifecycle are untouched. A memorial entry missing its
/// date gets one starting now so the window can eventually run out.
pub fn retire_expired(roster: &mut [Entity], now: DateTime<Utc>) -> MemorialReport {
    let cutoff = now - Duration::days(MEMORIAL_RETENTION_DAYS);
    let mut report = MemorialReport::default();

    for entity in roster.iter_mut() {
        if entity.lifecycle_state != LifecycleState::Memorial {
            continue;
        }

        let memorial_since = match entity.memorial_since {
            Some(date) => date,
            None => {
                warn!(
                    "Memorial entity {} has no memorial date, starting retention now",
                    entity.id
                );
                entity.memorial_since = Some(now);
                report.memorial_kept += 1;
                continue;
            }
        };

        if memorial_since < cutoff {
            entity.lifecycle_state = LifecycleState::Retired;
            entity.record_temperature(0.0);
            report.retired_now += 1;
            info!(
                "Retired {} from memorial after {} days",
                entity.id,
                (now - memorial_since).num_days()
            );
        } else {
            report.memorial_kept += 1;
        }
    }

    report
}
