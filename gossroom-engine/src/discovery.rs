//! Candidate discovery for untracked names
//!
//! Accepted articles are scanned for capitalized word pairs that sit
//! near a role word ("singer", "actor") or a drama verb ("arrested",
//! "spotted"). Shapes that look corporate or geographic are filtered
//! out. Surviving names accumulate occurrences in a persisted ledger
//! and are promoted into the roster once they clear the threshold
//! inside the rolling window.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use gossroom_core::{Entity, LifecycleState, NEW_ENTITY_PROMOTION_DAYS};

/// Occurrences required inside the window before promotion
pub const PROMOTION_THRESHOLD: u32 = 3;
/// Candidates unseen for this long are dropped from the ledger
pub const DISCOVERY_WINDOW_DAYS: i64 = 30;

/// Words that mark a nearby capitalized pair as probably a person
const ROLE_WORDS: &[&str] = &[
    "actor",
    "actress",
    "singer",
    "rapper",
    "star",
    "model",
    "host",
    "comedian",
    "athlete",
    "influencer",
];

const DRAMA_VERBS: &[&str] = &[
    "arrested",
    "divorced",
    "married",
    "spotted",
    "dating",
    "engaged",
    "slammed",
    "confirmed",
    "denied",
    "revealed",
];

/// Capitalized words that disqualify a sequence as a person name
const NON_PERSON_WORDS: &[&str] = &[
    "The",
    "And",
    "New",
    "Latest",
    "Breaking",
    "Inc",
    "Corp",
    "Ltd",
    "Records",
    "Entertainment",
    "Studios",
    "Productions",
    "Pictures",
    "News",
    "Media",
    "Angeles",
    "York",
    "Vegas",
    "Hollywood",
    "Awards",
];

/// How many words on each side of a name count as its context
const CONTEXT_WINDOW_WORDS: usize = 4;

/// An untracked name accumulating discovery occurrences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryCandidate {
    /// Normalized id form, e.g. `sabrina_carpenter`
    pub key: String,
    /// Surface form as first observed
    pub display_name: String,
    pub occurrences: u32,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

/// Persisted ledger of discovery candidates keyed by normalized id
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateLedger {
    candidates: IndexMap<String, DiscoveryCandidate>,
}

impl CandidateLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one occurrence of a surface name. Returns the candidate's
    /// occurrence count after the update.
    pub fn observe(&mut self, surface_name: &str, seen_at: DateTime<Utc>) -> u32 {
        let key = normalize_candidate_id(surface_name);
        let candidate = self
            .candidates
            .entry(key.clone())
            .or_insert_with(|| DiscoveryCandidate {
                key,
                display_name: surface_name.to_string(),
                occurrences: 0,
                first_seen: seen_at,
                last_seen: seen_at,
            });
        candidate.occurrences += 1;
        if seen_at > candidate.last_seen {
            candidate.last_seen = seen_at;
        }
        candidate.occurrences
    }

    /// Drop candidates not seen inside the rolling window. Returns how
    /// many were removed.
    pub fn prune(&mut self, now: DateTime<Utc>) -> usize {
        let cutoff = now - Duration::days(DISCOVERY_WINDOW_DAYS);
        let before = self.candidates.len();
        self.candidates.retain(|_, candidate| candidate.last_seen >= cutoff);
        let removed = before - self.candidates.len();
        if removed > 0 {
            debug!("Pruned {} stale discovery candidates", removed);
        }
        removed
    }

    /// Candidates that cleared the promotion bar: the occurrence
    /// threshold, or any occurrence at all for whitelisted names.
    pub fn promotable(&self, whitelist: &HashSet<String>) -> Vec<&DiscoveryCandidate> {
        self.candidates
            .values()
            .filter(|c| c.occurrences >= PROMOTION_THRESHOLD || whitelist.contains(&c.key))
            .collect()
    }

    pub fn remove(&mut self, key: &str) -> Option<DiscoveryCandidate> {
        self.candidates.shift_remove(key)
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Extract person-shaped names from article text. `known` holds ids
/// already in the roster; their surface forms are skipped.
pub fn extract_candidate_names(text: &str, known: &HashSet<String>) -> Vec<String> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let mut found = Vec::new();
    let mut index = 0;

    while index < tokens.len() {
        let run_len = capitalized_run_len(&tokens, index);
        if run_len < 2 {
            index += 1;
            continue;
        }

        let words: Vec<&str> = tokens[index..index + run_len]
            .iter()
            .map(|t| trim_token(t))
            .collect();

        if words.iter().any(|w| NON_PERSON_WORDS.contains(w)) {
            index += run_len;
            continue;
        }

        let surface = words.join(" ");
        let key = normalize_candidate_id(&surface);
        if key.len() > 2
            && !known.contains(&key)
            && has_person_context(&tokens, index, run_len)
            && !found.contains(&surface)
        {
            found.push(surface);
        }
        index += run_len;
    }

    found
}

/// Length of the run of 2-3 capitalized name words starting at
/// `start`, or 0. A capitalized role word or drama verb ("Singer",
/// "Spotted") breaks the run instead of joining it.
fn capitalized_run_len(tokens: &[&str], start: usize) -> usize {
    let run = tokens[start..]
        .iter()
        .take(3)
        .take_while(|t| {
            let word = trim_token(t);
            is_capitalized_word(word) && !is_context_word(word)
        })
        .count();
    if run >= 2 { run } else { 0 }
}

fn is_context_word(word: &str) -> bool {
    let lowered = word.to_lowercase();
    ROLE_WORDS.contains(&lowered.as_str()) || DRAMA_VERBS.contains(&lowered.as_str())
}

fn trim_token(token: &str) -> &str {
    token.trim_matches(|c: char| !c.is_alphanumeric())
}

fn is_capitalized_word(word: &str) -> bool {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) if first.is_uppercase() => {
            word.len() >= 2 && chars.all(|c| c.is_lowercase() && c.is_alphabetic())
        }
        _ => false,
    }
}

/// True when a role word or drama verb appears within the context
/// window around the name run.
fn has_person_context(tokens: &[&str], start: usize, run_len: usize) -> bool {
    let window_start = start.saturating_sub(CONTEXT_WINDOW_WORDS);
    let window_end = (start + run_len + CONTEXT_WINDOW_WORDS).min(tokens.len());

    tokens[window_start..window_end]
        .iter()
        .enumerate()
        .filter(|(offset, _)| {
            let position = window_start + offset;
            position < start || position >= start + run_len
        })
        .any(|(_, token)| is_context_word(trim_token(token)))
}

/// Normalize a surface name to roster id form
pub fn normalize_candidate_id(name: &str) -> String {
    let cleaned: String = name
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c
            } else {
                ' '
            }
        })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Build the roster entry for a promoted candidate. It starts in the
/// probation lifecycle with temperature 0 until scoring picks it up.
pub fn promote_candidate(candidate: &DiscoveryCandidate, now: DateTime<Utc>) -> Entity {
    info!(
        "Promoting discovery candidate {} ({} occurrences)",
        candidate.key, candidate.occurrences
    );
    let mut entity = Entity::new(&candidate.key, &candidate.display_name);
    entity.lifecycle_state = LifecycleState::New;
    entity.added_at = Some(now);
    entity
}

/// Move entities out of the probation lifecycle once they have been on
/// the roster long enough. Returns how many were promoted.
pub fn promote_matured(roster: &mut [Entity], now: DateTime<Utc>) -> usize {
    let cutoff = now - Duration::days(NEW_ENTITY_PROMOTION_DAYS);
    let mut promoted = 0usize;

    for entity in roster.iter_mut() {
        if entity.lifecycle_state != LifecycleState::New {
            continue;
        }
        match entity.added_at {
            Some(added_at) if added_at < cutoff => {
                entity.lifecycle_state = LifecycleState::Active;
                info!("Promoted {} from new to active", entity.id);
                promoted += 1;
            }
            _ => {}
        }
    }
    promoted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_known() -> HashSet<String> {
        HashSet::new()
    }

    #[test]
    fn test_extract_name_near_role_word() {
        let names = extract_candidate_names(
            "Singer Sabrina Carpenter stunned fans at the show",
            &no_known(),
        );
        assert_eq!(names, vec!["Sabrina Carpenter".to_string()]);
    }

    #[test]
    fn test_extract_name_near_drama_verb() {
        let names = extract_candidate_names(
            "Fans went wild after Pedro Pascal was spotted leaving the venue",
            &no_known(),
        );
        assert_eq!(names, vec!["Pedro Pascal".to_string()]);
    }

    #[test]
    fn test_extract_requires_context() {
        let names = extract_candidate_names(
            "Pedro Pascal released a statement through his team yesterday",
            &no_known(),
        );
        assert!(names.is_empty());
    }

    #[test]
    fn test_extract_skips_corporate_shapes() {
        let names = extract_candidate_names(
            "Sony Pictures confirmed the sequel with a new star attached",
            &no_known(),
        );
        assert!(names.is_empty());
    }

    #[test]
    fn test_extract_skips_place_names() {
        let names =
            extract_candidate_names("The actor was arrested in New York on Friday", &no_known());
        assert!(names.is_empty());
    }

    #[test]
    fn test_extract_skips_known_entities() {
        let mut known = HashSet::new();
        known.insert("pedro_pascal".to_string());
        let names = extract_candidate_names(
            "Actor Pedro Pascal was spotted at the premiere",
            &known,
        );
        assert!(names.is_empty());
    }

    #[test]
    fn test_extract_three_word_name() {
        let names = extract_candidate_names(
            "Singer Olivia Newton John was honored at the gala",
            &no_known(),
        );
        assert_eq!(names, vec!["Olivia Newton John".to_string()]);
    }

    #[test]
    fn test_normalize_candidate_id() {
        assert_eq!(normalize_candidate_id("Sabrina Carpenter"), "sabrina_carpenter");
        assert_eq!(normalize_candidate_id("Jean-Luc Picard"), "jean_luc_picard");
        assert_eq!(normalize_candidate_id("  A.B.  "), "a_b");
    }

    #[test]
    fn test_ledger_observe_accumulates() {
        let now = Utc::now();
        let mut ledger = CandidateLedger::new();
        assert_eq!(ledger.observe("Sabrina Carpenter", now), 1);
        assert_eq!(ledger.observe("Sabrina Carpenter", now), 2);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_ledger_prune_drops_stale() {
        let now = Utc::now();
        let mut ledger = CandidateLedger::new();
        ledger.observe("Old Name", now - Duration::days(31));
        ledger.observe("Fresh Name", now - Duration::days(2));

        assert_eq!(ledger.prune(now), 1);
        assert_eq!(ledger.len(), 1);
        assert!(ledger.promotable(&HashSet::new()).is_empty());
    }

    #[test]
    fn test_promotable_at_threshold() {
        let now = Utc::now();
        let mut ledger = CandidateLedger::new();
        for _ in 0..PROMOTION_THRESHOLD {
            ledger.observe("Sabrina Carpenter", now);
        }
        ledger.observe("One Hit", now);

        let promotable = ledger.promotable(&HashSet::new());
        assert_eq!(promotable.len(), 1);
        assert_eq!(promotable[0].key, "sabrina_carpenter");
    }

    #[test]
    fn test_whitelist_promotes_on_first_occurrence() {
        let now = Utc::now();
        let mut ledger = CandidateLedger::new();
        ledger.observe("Cover Star", now);

        let mut whitelist = HashSet::new();
        whitelist.insert("cover_star".to_string());

        let promotable = ledger.promotable(&whitelist);
        assert_eq!(promotable.len(), 1);
    }

    #[test]
    fn test_promote_candidate_starts_in_probation() {
        let now = Utc::now();
        let candidate = DiscoveryCandidate {
            key: "sabrina_carpenter".to_string(),
            display_name: "Sabrina Carpenter".to_string(),
            occurrences: 3,
            first_seen: now,
            last_seen: now,
        };

        let entity = promote_candidate(&candidate, now);
        assert_eq!(entity.id, "sabrina_carpenter");
        assert_eq!(entity.lifecycle_state, LifecycleState::New);
        assert_eq!(entity.temperature, 0.0);
        assert_eq!(entity.added_at, Some(now));
    }

    #[test]
    fn test_promote_matured_after_probation() {
        let now = Utc::now();
        let mut fresh = Entity::new("fresh", "Fresh Face");
        fresh.lifecycle_state = LifecycleState::New;
        fresh.added_at = Some(now - Duration::days(5));

        let mut seasoned = Entity::new("seasoned", "Seasoned Face");
        seasoned.lifecycle_state = LifecycleState::New;
        seasoned.added_at = Some(now - Duration::days(31));

        let mut roster = vec![fresh, seasoned];
        assert_eq!(promote_matured(&mut roster, now), 1);
        assert_eq!(roster[0].lifecycle_state, LifecycleState::New);
        assert_eq!(roster[1].lifecycle_state, LifecycleState::Active);
    }
}
