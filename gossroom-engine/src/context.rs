//! Batch processing context
//!
//! `ScoringContext` owns the loaded pipeline state and walks each batch
//! through the gates in order: seen-cache suppression, the acceptance
//! policy, mention extraction, then deduplication. Survivors update the
//! seen cache, the mention log and the discovery ledger. Scoring and
//! candidate promotion run against the same state, and nothing touches
//! disk until the caller saves.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use gossroom_core::{fingerprint, Article, Entity, GossResult, RawArticle};

use crate::catalog::NameCatalog;
use crate::dedup::{deduplicate, normalize_title, SeenCache, DEFAULT_DEDUP_THRESHOLD};
use crate::discovery::{extract_candidate_names, promote_candidate, CandidateLedger};
use crate::mention::MentionExtractor;
use crate::policy::ArticleAcceptancePolicy;
use crate::state::{MentionLog, StateDir};
use crate::temperature::score_roster;
use crate::{discovery, memorial};

/// Counts out of one processed batch plus the surviving articles
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Articles that cleared every gate, highest drama first
    pub kept: Vec<Article>,
    pub fetched: usize,
    pub previously_seen: usize,
    pub rejected: usize,
    /// Policy-accepted count, before dedup
    pub accepted: usize,
    pub duplicates_removed: usize,
}

/// All pipeline state loaded for one run
pub struct ScoringContext {
    pub roster: Vec<Entity>,
    pub seen: SeenCache,
    pub mention_log: MentionLog,
    pub candidates: CandidateLedger,
    pub whitelist: HashSet<String>,
    dedup_threshold: f64,
}

impl ScoringContext {
    /// Load all pipeline state from the state directory
    pub fn load(state: &StateDir, now: DateTime<Utc>) -> GossResult<Self> {
        Ok(Self {
            roster: state.load_roster()?,
            seen: state.load_seen(now)?,
            mention_log: state.load_mentions()?,
            candidates: state.load_candidates()?,
            whitelist: state.load_whitelist()?,
            dedup_threshold: DEFAULT_DEDUP_THRESHOLD,
        })
    }

    /// Write back everything the core pipeline owns. The posted ledger
    /// is saved separately after publishing.
    pub fn save(&self, state: &StateDir) -> GossResult<()> {
        state.save_roster(&self.roster)?;
        state.save_seen(&self.seen)?;
        state.save_mentions(&self.mention_log)?;
        state.save_candidates(&self.candidates)
    }

    /// Run one batch of raw articles through the gates. Articles that
    /// survive are recorded in the seen cache and mention log and
    /// scanned for discovery candidates. A roster problem surfaces
    /// before any state changes.
    pub fn process_batch(
        &mut self,
        raw_articles: Vec<RawArticle>,
        now: DateTime<Utc>,
    ) -> GossResult<BatchOutcome> {
        let catalog = NameCatalog::from_roster(&self.roster)?;
        let extractor = MentionExtractor::new(&catalog);
        let policy = ArticleAcceptancePolicy::new();

        let mut outcome = BatchOutcome {
            fetched: raw_articles.len(),
            ..BatchOutcome::default()
        };

        let mut accepted = Vec::new();
        for raw in raw_articles {
            let normalized_title = normalize_title(&raw.title);
            let article_fingerprint = fingerprint(&normalized_title, &raw.source_id);
            if self.seen.contains(&article_fingerprint) {
                outcome.previously_seen += 1;
                continue;
            }

            let decision = policy.evaluate(&catalog, &raw.title, &raw.body);
            if !decision.accepted {
                debug!("Rejected '{}': {:?}", raw.title, decision.reject_reason);
                outcome.rejected += 1;
                continue;
            }

            let mut article = Article::from_raw(raw, normalized_title);
            let mentions = extractor.extract(&article.search_text(), article.source_weight);
            let celebrities = extractor.display_names(&mentions);
            article.set_mentions(mentions, celebrities);
            accepted.push(article);
        }
        outcome.accepted = accepted.len();

        let dedup = deduplicate(accepted, self.dedup_threshold);
        outcome.duplicates_removed = dedup.removed;

        let known: HashSet<String> = self.roster.iter().map(|e| e.id.clone()).collect();
        for article in &dedup.kept {
            self.seen.record(article.fingerprint.clone(), now);
            for (entity_id, weighted) in &article.mentions {
                self.mention_log
                    .record(entity_id, article.published_at, *weighted);
            }
            for name in extract_candidate_names(&article.search_text(), &known) {
                self.candidates.observe(&name, article.published_at);
            }
        }

        outcome.kept = dedup.kept;
        info!(
            "Batch: {} fetched, {} previously seen, {} rejected, {} accepted, {} duplicates removed",
            outcome.fetched,
            outcome.previously_seen,
            outcome.rejected,
            outcome.accepted,
            outcome.duplicates_removed
        );
        Ok(outcome)
    }

    /// Prune stale mention history and rescore every scorable entity.
    /// Returns the number of entities updated.
    pub fn rescore(&mut self, now: DateTime<Utc>) -> usize {
        self.mention_log.prune(now);
        score_roster(&mut self.roster, self.mention_log.histories(), now)
    }

    /// Promote cleared discovery candidates into the roster. Candidates
    /// colliding with an existing roster id are dropped instead.
    pub fn promote_candidates(&mut self, now: DateTime<Utc>) -> usize {
        self.candidates.prune(now);

        let keys: Vec<String> = self
            .candidates
            .promotable(&self.whitelist)
            .iter()
            .map(|c| c.key.clone())
            .collect();

        let mut promoted = 0usize;
        for key in keys {
            if self.roster.iter().any(|e| e.id == key) {
                self.candidates.remove(&key);
                continue;
            }
            if let Some(candidate) = self.candidates.remove(&key) {
                self.roster.push(promote_candidate(&candidate, now));
                promoted += 1;
            }
        }
        promoted
    }

    /// Move probation entities to active once their window has passed
    pub fn promote_matured(&mut self, now: DateTime<Utc>) -> usize {
        discovery::promote_matured(&mut self.roster, now)
    }

    /// Retire memorial entities past the retention window
    pub fn cleanup_memorials(&mut self, now: DateTime<Utc>) -> memorial::MemorialReport {
        memorial::retire_expired(&mut self.roster, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use gossroom_core::LifecycleState;

    fn raw_article(title: &str, body: &str, source_id: &str, weight: u32) -> RawArticle {
        RawArticle {
            title: title.to_string(),
            body: body.to_string(),
            source_id: source_id.to_string(),
            source_weight: weight,
            published_at: Utc::now(),
            origin_url: format!("https://{}.example.com/story", source_id),
        }
    }

    fn context_with_roster(roster: Vec<Entity>) -> ScoringContext {
        ScoringContext {
            roster,
            seen: SeenCache::new(),
            mention_log: MentionLog::new(),
            candidates: CandidateLedger::new(),
            whitelist: HashSet::new(),
            dedup_threshold: DEFAULT_DEDUP_THRESHOLD,
        }
    }

    fn basic_roster() -> Vec<Entity> {
        let mut taylor = Entity::new("taylor_swift", "Taylor Swift");
        taylor.aliases = vec!["T-Swift".to_string()];
        let drake = Entity::new("drake", "Drake");
        vec![taylor, drake]
    }

    #[test]
    fn test_process_batch_applies_all_gates() {
        let now = Utc::now();
        let mut ctx = context_with_roster(basic_roster());

        let batch = vec![
            raw_article(
                "Taylor Swift spotted at dinner amid dating rumors",
                "Fans noticed the pair leaving together.",
                "tmz",
                3,
            ),
            raw_article(
                "Taylor Swift Spotted At Dinner Amid Dating Rumors!",
                "The couple left together.",
                "people",
                1,
            ),
            raw_article(
                "Quarterly earnings beat revenue expectations",
                "Shareholders approved the merger.",
                "tmz",
                3,
            ),
        ];

        let outcome = ctx.process_batch(batch, now).unwrap();
        assert_eq!(outcome.fetched, 3);
        assert_eq!(outcome.rejected, 1);
        assert_eq!(outcome.accepted, 2);
        assert_eq!(outcome.duplicates_removed, 1);
        assert_eq!(outcome.kept.len(), 1);
        // Higher source weight wins the duplicate cluster
        assert_eq!(outcome.kept[0].source_id, "tmz");
    }

    #[test]
    fn test_process_batch_suppresses_seen_articles() {
        let now = Utc::now();
        let mut ctx = context_with_roster(basic_roster());

        let story = || {
            vec![raw_article(
                "Drake drops surprise diss track",
                "The feud escalates with a midnight release.",
                "tmz",
                3,
            )]
        };

        let first = ctx.process_batch(story(), now).unwrap();
        assert_eq!(first.kept.len(), 1);

        let second = ctx.process_batch(story(), now).unwrap();
        assert_eq!(second.previously_seen, 1);
        assert!(second.kept.is_empty());
    }

    #[test]
    fn test_process_batch_records_mentions() {
        let now = Utc::now();
        let mut ctx = context_with_roster(basic_roster());

        let batch = vec![raw_article(
            "Taylor Swift and Drake feud rumors heat up",
            "Sources say the drama started backstage.",
            "tmz",
            3,
        )];

        ctx.process_batch(batch, now).unwrap();
        assert!(ctx.mention_log.histories().contains_key("taylor_swift"));
        assert!(ctx.mention_log.histories().contains_key("drake"));
    }

    #[test]
    fn test_process_batch_observes_candidates() {
        let now = Utc::now();
        let mut ctx = context_with_roster(basic_roster());

        let batch = vec![raw_article(
            "Taylor Swift dating rumors swirl",
            "Singer Sabrina Carpenter was spotted at the same party.",
            "tmz",
            3,
        )];

        ctx.process_batch(batch, now).unwrap();
        assert_eq!(ctx.candidates.len(), 1);
    }

    #[test]
    fn test_config_error_leaves_state_untouched() {
        let now = Utc::now();
        let mut first = Entity::new("kanye_west", "Kanye West");
        first.aliases = vec!["Kanye".to_string()];
        let mut second = Entity::new("kanye_east", "Kanye East");
        second.aliases = vec!["Kanye".to_string()];
        let mut ctx = context_with_roster(vec![first, second]);

        let batch = vec![raw_article(
            "Kanye spotted in new feud",
            "Drama everywhere.",
            "tmz",
            3,
        )];

        assert!(ctx.process_batch(batch, now).is_err());
        assert!(ctx.seen.is_empty());
        assert_eq!(ctx.mention_log.entity_count(), 0);
    }

    #[test]
    fn test_rescore_moves_temperatures() {
        let now = Utc::now();
        let mut ctx = context_with_roster(basic_roster());

        let batch = vec![raw_article(
            "Taylor Swift lawsuit drama explodes",
            "Court documents reveal the feud.",
            "tmz",
            3,
        )];
        ctx.process_batch(batch, now).unwrap();

        let updated = ctx.rescore(now);
        assert_eq!(updated, 2);

        let taylor = ctx.roster.iter().find(|e| e.id == "taylor_swift").unwrap();
        let drake = ctx.roster.iter().find(|e| e.id == "drake").unwrap();
        assert!(taylor.temperature > 0.0);
        assert_eq!(drake.temperature, 0.0);
    }

    #[test]
    fn test_promote_candidates_at_threshold() {
        let now = Utc::now();
        let mut ctx = context_with_roster(basic_roster());
        for _ in 0..3 {
            ctx.candidates.observe("Sabrina Carpenter", now);
        }
        ctx.candidates.observe("One Timer", now);

        let promoted = ctx.promote_candidates(now);
        assert_eq!(promoted, 1);

        let sabrina = ctx
            .roster
            .iter()
            .find(|e| e.id == "sabrina_carpenter")
            .unwrap();
        assert_eq!(sabrina.lifecycle_state, LifecycleState::New);
        assert_eq!(ctx.candidates.len(), 1);
    }

    #[test]
    fn test_promote_skips_existing_roster_id() {
        let now = Utc::now();
        let mut ctx = context_with_roster(basic_roster());
        for _ in 0..3 {
            ctx.candidates.observe("Taylor Swift", now);
        }

        let promoted = ctx.promote_candidates(now);
        assert_eq!(promoted, 0);
        assert_eq!(ctx.roster.len(), 2);
        // Candidate is consumed either way
        assert!(ctx.candidates.is_empty());
    }

    #[test]
    fn test_memorial_untouched_by_batch_and_scoring() {
        let now = Utc::now();
        let mut roster = basic_roster();
        let mut legend = Entity::new("legend", "The Legend");
        legend.lifecycle_state = LifecycleState::Memorial;
        legend.memorial_since = Some(now - Duration::days(100));
        legend.temperature = 55.0;
        legend.previous_temperature = 55.0;
        roster.push(legend);
        let mut ctx = context_with_roster(roster);

        let batch = vec![raw_article(
            "The Legend remembered at awards drama",
            "A tribute amid the controversy.",
            "tmz",
            3,
        )];
        ctx.process_batch(batch, now).unwrap();
        ctx.rescore(now);

        let legend = ctx.roster.iter().find(|e| e.id == "legend").unwrap();
        assert_eq!(legend.temperature, 55.0);
        assert_eq!(legend.lifecycle_state, LifecycleState::Memorial);
    }
}
