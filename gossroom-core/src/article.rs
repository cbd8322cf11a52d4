//! Article data structures
//!
//! A `RawArticle` is what feed ingestion hands over: plain fields, no
//! derived state. An `Article` is the annotated form flowing through the
//! pipeline: normalized title, fingerprint, per-entity mentions, and the
//! drama score used for duplicate tie-breaking.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// An ingested content unit before annotation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawArticle {
    /// Title as published by the feed
    pub title: String,
    /// Summary/body text, already HTML-stripped
    pub body: String,
    /// Stable source identifier (e.g. "tmz")
    pub source_id: String,
    /// Source importance tier, 1-3
    pub source_weight: u32,
    /// Publication date
    pub published_at: DateTime<Utc>,
    /// Link to the original article
    pub origin_url: String,
}

/// An accepted article annotated by the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub raw_title: String,
    pub raw_body: String,
    pub source_id: String,
    pub source_weight: u32,
    pub published_at: DateTime<Utc>,
    pub origin_url: String,
    /// Lowercased, punctuation-stripped, stopword-free title
    pub normalized_title: String,
    /// Hash of (normalized_title, source_id) for exact-duplicate suppression
    pub fingerprint: String,
    /// entity_id -> weighted hit count, computed once
    #[serde(default)]
    pub mentions: IndexMap<String, f64>,
    /// Sum of mention weights; duplicate tie-break keeps the highest
    #[serde(default)]
    pub drama_score: f64,
    /// Display names of mentioned entities, for downstream publishing
    #[serde(default)]
    pub celebrities: Vec<String>,
}

impl Article {
    /// Build an annotated article from its raw form and normalized title.
    /// Mentions and drama score start empty; the extractor fills them.
    pub fn from_raw(raw: RawArticle, normalized_title: String) -> Self {
        let fingerprint = fingerprint(&normalized_title, &raw.source_id);
        Self {
            raw_title: raw.title,
            raw_body: raw.body,
            source_id: raw.source_id,
            source_weight: raw.source_weight,
            published_at: raw.published_at,
            origin_url: raw.origin_url,
            normalized_title,
            fingerprint,
            mentions: IndexMap::new(),
            drama_score: 0.0,
            celebrities: Vec::new(),
        }
    }

    /// Attach extraction results
    pub fn set_mentions(&mut self, mentions: IndexMap<String, f64>, celebrities: Vec<String>) {
        self.drama_score = mentions.values().sum();
        self.mentions = mentions;
        self.celebrities = celebrities;
    }

    /// Title and body joined for alias scanning
    pub fn search_text(&self) -> String {
        format!("{} {}", self.raw_title, self.raw_body)
    }
}

/// Deterministic fingerprint over (normalized_title, source_id).
/// Truncated sha256 hex, 16 chars.
pub fn fingerprint(normalized_title: &str, source_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalized_title.as_bytes());
    hasher.update(b"|");
    hasher.update(source_id.as_bytes());
    hex::encode(&hasher.finalize()[..8])
}
