//! Ledger of already-republished articles

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Most recent entries kept in the ledger
pub const POSTED_LEDGER_CAP: usize = 300;

/// One republished article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostedRecord {
    pub fingerprint: String,
    pub posted_at: DateTime<Utc>,
}

/// Bounded ledger of fingerprints already posted, oldest first. Keeps
/// the republisher from posting the same story twice across runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostedLedger {
    records: Vec<PostedRecord>,
}

impl PostedLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, fingerprint: &str) -> bool {
        self.records.iter().any(|r| r.fingerprint == fingerprint)
    }

    /// Record a posted fingerprint, dropping the oldest entries once
    /// the cap is exceeded.
    pub fn record(&mut self, fingerprint: impl Into<String>, posted_at: DateTime<Utc>) {
        self.records.push(PostedRecord {
            fingerprint: fingerprint.into(),
            posted_at,
        });
        if self.records.len() > POSTED_LEDGER_CAP {
            let excess = self.records.len() - POSTED_LEDGER_CAP;
            self.records.drain(..excess);
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
