//! Near-duplicate article detection
//!
//! The same story lands from many feeds with punctuation, casing, and
//! stopword variations. Titles are normalized, compared with a
//! normalized Levenshtein ratio, and collapsed greedily so the highest
//! drama representative of each cluster survives. A persisted
//! fingerprint cache suppresses exact re-ingestion across runs.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strsim::normalized_levenshtein;
use tracing::debug;

use gossroom_core::Article;

/// Titles at or above this similarity are the same story
pub const DEFAULT_DEDUP_THRESHOLD: f64 = 0.8;

/// Days a seen fingerprint is retained across runs
pub const SEEN_RETENTION_DAYS: i64 = 7;

/// Stopwords removed during title normalization
const TITLE_STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "for", "to", "of", "in", "on",
    "at", "with", "from", "by", "as", "is", "are", "was", "were", "be",
    "has", "have", "had", "his", "her", "their", "its", "this", "that",
    "it", "he", "she", "they",
];

/// Normalize a title for fingerprinting and similarity comparison:
/// lowercase, punctuation to spaces, stopwords removed, whitespace
/// collapsed.
pub fn normalize_title(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .filter(|w| !TITLE_STOPWORDS.contains(w))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Similarity ratio between two normalized titles (0.0 - 1.0),
/// normalized Levenshtein distance
pub fn similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    normalized_levenshtein(a, b)
}

/// Result of collapsing a batch
#[derive(Debug)]
pub struct DedupOutcome {
    /// Survivors, highest drama first
    pub kept: Vec<Article>,
    /// Articles discarded as duplicates
    pub removed: usize,
}

/// Collapse near-duplicates, keeping the highest-drama representative
/// of each cluster.
///
/// Candidates are ordered by drama score descending with published date
/// descending as the tie-break, then greedily kept unless an already
/// kept article shares the fingerprint or clears the similarity
/// threshold. O(n^2) over kept candidates, fine for batches in the low
/// hundreds.
pub fn deduplicate(mut articles: Vec<Article>, threshold: f64) -> DedupOutcome {
    articles.sort_by(|a, b| {
        b.drama_score
            .total_cmp(&a.drama_score)
            .then_with(|| b.published_at.cmp(&a.published_at))
            .then_with(|| a.fingerprint.cmp(&b.fingerprint))
    });

    let mut kept: Vec<Article> = Vec::new();
    let mut kept_fingerprints: HashSet<String> = HashSet::new();
    let mut removed = 0usize;

    for article in articles {
        if kept_fingerprints.contains(&article.fingerprint) {
            removed += 1;
            continue;
        }
        let duplicate_of = kept.iter().find(|k| {
            similarity(&k.normalized_title, &article.normalized_title) >= threshold
        });
        if let Some(winner) = duplicate_of {
            debug!(
                "Duplicate collapsed: '{}' into '{}'",
                article.raw_title, winner.raw_title
            );
            removed += 1;
            continue;
        }
        kept_fingerprints.insert(article.fingerprint.clone());
        kept.push(article);
    }

    DedupOutcome { kept, removed }
}

/// Persisted cache of previously seen article fingerprints
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct SeenCache {
    entries: HashMap<String, DateTime<Utc>>,
}

impl SeenCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, fingerprint: &str) -> bool {
        self.entries.contains_key(fingerprint)
    }

    pub fn record(&mut self, fingerprint: impl Into<String>, seen_at: DateTime<Utc>) {
        self.entries.insert(fingerprint.into(), seen_at);
    }

    /// Drop fingerprints past the retention window, returning how many
    /// were removed
    pub fn prune(&mut self, now: DateTime<Utc>) -> usize {
        let cutoff = now - Duration::days(SEEN_RETENTION_DAYS);
        let before = self.entries.len();
        self.entries.retain(|_, seen_at| *seen_at >= cutoff);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
