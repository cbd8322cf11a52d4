//! Article acceptance policy
//!
//! Two-counter keyword heuristic, not a classifier. An article is
//! accepted when a tracked entity appears, at least one gossip keyword
//! hits, and off-topic (business/tech) keywords stay under the cap.

use crate::catalog::NameCatalog;

/// Minimum distinct gossip keywords required
const MIN_GOSSIP_HITS: usize = 1;
/// Articles with this many distinct off-topic keywords are rejected
const MAX_OFFTOPIC_HITS: usize = 2;

/// Topical keywords marking celebrity-gossip context
const GOSSIP_KEYWORDS: &[&str] = &[
    "drama", "scandal", "controversy", "relationship", "dating",
    "breakup", "marriage", "divorce", "affair", "feud", "fight",
    "arrest", "lawsuit", "court", "trial", "charges", "guilty",
    "pregnant", "baby", "wedding", "engaged", "split", "cheating",
    "rehab", "addiction", "overdose", "death", "died", "funeral",
    "fashion", "red carpet", "awards", "premiere", "party",
    "social media", "instagram", "twitter", "tiktok", "viral",
    "paparazzi", "photos", "spotted", "seen", "exclusive",
    "romance", "love", "hate", "beef", "diss", "shade", "tea",
];

/// Off-topic keywords; business/tech coverage that happens to name a
/// celebrity investor is not gossip
const OFFTOPIC_KEYWORDS: &[&str] = &[
    "vc industry", "venture capital", "funding round", "ipo",
    "stock price", "earnings", "quarterly", "revenue", "profit",
    "acquisition", "merger", "valuation", "investment", "startup",
    "cryptocurrency", "bitcoin", "blockchain", "nft", "defi",
    "software", "hardware", "algorithm", "api", "database",
    "cloud computing", "artificial intelligence", "machine learning",
    "cybersecurity", "data breach", "privacy policy", "market analysis",
    "financial report", "economic", "inflation", "interest rates",
    "gdp", "unemployment", "federal reserve", "wall street",
];

/// Why an article was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// No tracked entity alias appears in the text
    NoTrackedEntity,
    /// A tracked entity appears but no gossip keyword does
    NoGossipContext,
    /// Off-topic keyword count at or over the cap
    OffTopic,
}

/// Outcome of evaluating one article
#[derive(Debug, Clone)]
pub struct AcceptanceDecision {
    pub accepted: bool,
    /// Entity ids whose aliases appear in the text
    pub matched_entities: Vec<String>,
    pub gossip_hits: usize,
    pub offtopic_hits: usize,
    pub reject_reason: Option<RejectReason>,
}

/// Keyword-driven acceptance gate
#[derive(Default)]
pub struct ArticleAcceptancePolicy;

impl ArticleAcceptancePolicy {
    pub fn new() -> Self {
        Self
    }

    /// Decide whether title+body qualify as tracked celebrity gossip
    pub fn evaluate(
        &self,
        catalog: &NameCatalog,
        title: &str,
        body: &str,
    ) -> AcceptanceDecision {
        let text = format!("{} {}", title, body);
        let lowered = text.to_lowercase();

        let matched_entities: Vec<String> = catalog
            .entries()
            .iter()
            .filter(|e| e.count_mentions(&text) > 0)
            .map(|e| e.entity_id.clone())
            .collect();

        // Distinct keywords present, not occurrence counts
        let gossip_hits = GOSSIP_KEYWORDS
            .iter()
            .filter(|kw| lowered.contains(*kw))
            .count();
        let offtopic_hits = OFFTOPIC_KEYWORDS
            .iter()
            .filter(|kw| lowered.contains(*kw))
            .count();

        let reject_reason = if matched_entities.is_empty() {
            Some(RejectReason::NoTrackedEntity)
        } else if gossip_hits < MIN_GOSSIP_HITS {
            Some(RejectReason::NoGossipContext)
        } else if offtopic_hits >= MAX_OFFTOPIC_HITS {
            Some(RejectReason::OffTopic)
        } else {
            None
        };

        AcceptanceDecision {
            accepted: reject_reason.is_none(),
            matched_entities,
            gossip_hits,
            offtopic_hits,
            reject_reason,
        }
    }
}
