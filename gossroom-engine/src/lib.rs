//! Processing engine for the Gossroom drama pipeline
//!
//! This crate holds the batch pipeline itself: the alias catalog and
//! mention extractor, the acceptance policy, deduplication, temperature
//! scoring, candidate discovery, memorial cleanup, and the persisted
//! state the whole thing runs against.

pub mod catalog;
pub mod context;
pub mod dedup;
pub mod discovery;
pub mod memorial;
pub mod mention;
pub mod policy;
pub mod report;
pub mod state;
pub mod temperature;

pub use catalog::{CatalogEntry, NameCatalog, MIN_ALIAS_CHARS};
pub use context::{BatchOutcome, ScoringContext};
pub use dedup::{
    deduplicate, normalize_title, similarity, DedupOutcome, SeenCache, DEFAULT_DEDUP_THRESHOLD,
    SEEN_RETENTION_DAYS,
};
pub use discovery::{
    extract_candidate_names, normalize_candidate_id, promote_candidate, promote_matured,
    CandidateLedger, DiscoveryCandidate, DISCOVERY_WINDOW_DAYS, PROMOTION_THRESHOLD,
};
pub use memorial::{retire_expired, MemorialReport};
pub use mention::MentionExtractor;
pub use policy::{AcceptanceDecision, ArticleAcceptancePolicy, RejectReason};
pub use report::{
    EntitySnapshot, RunCounts, RunSummary, StepOutcome, StepReport, TemperatureReport,
};
pub use state::{MentionLog, StateDir};
pub use temperature::{
    compute_raw_score, percentile_cuts, score_roster, temperature_from_raw, MentionRecord,
    PercentileCuts, ScoreComponents, LOOKBACK_DAYS,
};
