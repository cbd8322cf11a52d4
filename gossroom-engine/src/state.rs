//! On-disk pipeline state
//!
//! Everything the pipeline remembers between runs lives in one state
//! directory:
//! - `roster.yaml` - tracked entities keyed by id (hand-editable)
//! - `seen_cache.json` - recently processed article fingerprints
//! - `mention_log.json` - per-entity daily mention history
//! - `candidates.json` - discovery candidate ledger
//! - `posted.json` - fingerprints already republished
//! - `last_run.json` - the most recent execution summary
//!
//! Every write goes through a temp file in the same directory followed
//! by a rename, so a crash mid-write leaves either the old file or the
//! new file, never half of one.

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};

use gossroom_core::{Entity, GossError, GossResult, PostedLedger};

use crate::dedup::SeenCache;
use crate::discovery::{normalize_candidate_id, CandidateLedger};
use crate::report::RunSummary;
use crate::temperature::{MentionRecord, LOOKBACK_DAYS};

const ROSTER_FILE: &str = "roster.yaml";
const WHITELIST_FILE: &str = "whitelist.yaml";
const SEEN_FILE: &str = "seen_cache.json";
const MENTIONS_FILE: &str = "mention_log.json";
const CANDIDATES_FILE: &str = "candidates.json";
const POSTED_FILE: &str = "posted.json";
const SUMMARY_FILE: &str = "last_run.json";

/// Per-entity daily mention history feeding the temperature scorer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MentionLog {
    entries: IndexMap<String, Vec<MentionRecord>>,
}

impl MentionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add weighted mentions for an entity, merged into the existing
    /// record when one exists for the same calendar day.
    pub fn record(&mut self, entity_id: &str, date: DateTime<Utc>, count: f64) {
        let history = self.entries.entry(entity_id.to_string()).or_default();
        match history
            .iter_mut()
            .find(|r| r.date.date_naive() == date.date_naive())
        {
            Some(existing) => existing.count += count,
            None => history.push(MentionRecord { date, count }),
        }
    }

    /// Drop records older than the scoring lookback. Entities left with
    /// no records disappear from the log. Returns dropped record count.
    pub fn prune(&mut self, now: DateTime<Utc>) -> usize {
        let cutoff = now - Duration::days(LOOKBACK_DAYS);
        let mut removed = 0usize;
        for history in self.entries.values_mut() {
            let before = history.len();
            history.retain(|r| r.date >= cutoff);
            removed += before - history.len();
        }
        self.entries.retain(|_, history| !history.is_empty());
        if removed > 0 {
            debug!("Pruned {} stale mention records", removed);
        }
        removed
    }

    pub fn histories(&self) -> &IndexMap<String, Vec<MentionRecord>> {
        &self.entries
    }

    pub fn entity_count(&self) -> usize {
        self.entries.len()
    }
}

/// Handle on the pipeline state directory
pub struct StateDir {
    root: PathBuf,
}

impl StateDir {
    /// Open the state directory, creating it if needed
    pub fn new(root: impl Into<PathBuf>) -> GossResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| {
            GossError::persistence(format!(
                "Failed to create state dir {}: {}",
                root.display(),
                e
            ))
        })?;
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Load the roster from YAML keyed by entity id. A missing file is
    /// a fresh install: empty roster.
    #[instrument(skip(self))]
    pub fn load_roster(&self) -> GossResult<Vec<Entity>> {
        let path = self.root.join(ROSTER_FILE);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No roster at {}, starting empty", path.display());
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(GossError::persistence(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let keyed: IndexMap<String, Entity> = serde_yaml::from_str(&contents)
            .map_err(|e| GossError::config(format!("Invalid roster {}: {}", path.display(), e)))?;

        let mut roster = Vec::with_capacity(keyed.len());
        for (key, entity) in keyed {
            if entity.id != key {
                return Err(GossError::config(format!(
                    "Roster key '{}' does not match entity id '{}'",
                    key, entity.id
                )));
            }
            roster.push(entity);
        }

        info!("Loaded {} entities from roster", roster.len());
        Ok(roster)
    }

    #[instrument(skip(self, roster))]
    pub fn save_roster(&self, roster: &[Entity]) -> GossResult<()> {
        let keyed: IndexMap<&str, &Entity> =
            roster.iter().map(|e| (e.id.as_str(), e)).collect();
        let contents = serde_yaml::to_string(&keyed)
            .map_err(|e| GossError::internal(format!("Failed to serialize roster: {}", e)))?;
        self.write_atomic(ROSTER_FILE, contents.as_bytes())?;
        info!("Saved {} entities to roster", roster.len());
        Ok(())
    }

    /// Load the discovery whitelist: a plain YAML list of names,
    /// normalized here to roster id form. Missing file means no
    /// whitelist.
    #[instrument(skip(self))]
    pub fn load_whitelist(&self) -> GossResult<HashSet<String>> {
        let path = self.root.join(WHITELIST_FILE);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashSet::new()),
            Err(e) => {
                return Err(GossError::persistence(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let names: Vec<String> = serde_yaml::from_str(&contents).map_err(|e| {
            GossError::config(format!("Invalid whitelist {}: {}", path.display(), e))
        })?;
        Ok(names
            .iter()
            .map(|name| normalize_candidate_id(name))
            .collect())
    }

    /// Load the seen cache with expired fingerprints already pruned
    #[instrument(skip(self))]
    pub fn load_seen(&self, now: DateTime<Utc>) -> GossResult<SeenCache> {
        let mut seen: SeenCache = self.read_json(SEEN_FILE)?.unwrap_or_default();
        seen.prune(now);
        Ok(seen)
    }

    #[instrument(skip(self, seen))]
    pub fn save_seen(&self, seen: &SeenCache) -> GossResult<()> {
        self.write_json(SEEN_FILE, seen)
    }

    #[instrument(skip(self))]
    pub fn load_mentions(&self) -> GossResult<MentionLog> {
        Ok(self.read_json(MENTIONS_FILE)?.unwrap_or_default())
    }

    #[instrument(skip(self, mentions))]
    pub fn save_mentions(&self, mentions: &MentionLog) -> GossResult<()> {
        self.write_json(MENTIONS_FILE, mentions)
    }

    #[instrument(skip(self))]
    pub fn load_candidates(&self) -> GossResult<CandidateLedger> {
        Ok(self.read_json(CANDIDATES_FILE)?.unwrap_or_default())
    }

    #[instrument(skip(self, candidates))]
    pub fn save_candidates(&self, candidates: &CandidateLedger) -> GossResult<()> {
        self.write_json(CANDIDATES_FILE, candidates)
    }

    #[instrument(skip(self))]
    pub fn load_posted(&self) -> GossResult<PostedLedger> {
        Ok(self.read_json(POSTED_FILE)?.unwrap_or_default())
    }

    #[instrument(skip(self, posted))]
    pub fn save_posted(&self, posted: &PostedLedger) -> GossResult<()> {
        self.write_json(POSTED_FILE, posted)
    }

    #[instrument(skip(self))]
    pub fn load_summary(&self) -> GossResult<Option<RunSummary>> {
        self.read_json(SUMMARY_FILE)
    }

    #[instrument(skip(self, summary))]
    pub fn save_summary(&self, summary: &RunSummary) -> GossResult<()> {
        self.write_json(SUMMARY_FILE, summary)
    }

    fn read_json<T: DeserializeOwned>(&self, file_name: &str) -> GossResult<Option<T>> {
        let path = self.root.join(file_name);
        let contents = match fs::read(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No state file {}", path.display());
                return Ok(None);
            }
            Err(e) => {
                return Err(GossError::persistence(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        let value = serde_json::from_slice(&contents)
            .map_err(|e| GossError::parse(format!("Failed to parse {}: {}", path.display(), e)))?;
        Ok(Some(value))
    }

    fn write_json<T: Serialize>(&self, file_name: &str, value: &T) -> GossResult<()> {
        let contents = serde_json::to_vec_pretty(value)
            .map_err(|e| GossError::internal(format!("Failed to serialize {}: {}", file_name, e)))?;
        self.write_atomic(file_name, &contents)
    }

    /// Temp file in the state dir, then rename over the target
    fn write_atomic(&self, file_name: &str, contents: &[u8]) -> GossResult<()> {
        let target = self.root.join(file_name);
        let mut temp = NamedTempFile::new_in(&self.root).map_err(|e| {
            GossError::persistence(format!(
                "Failed to create temp file in {}: {}",
                self.root.display(),
                e
            ))
        })?;
        temp.write_all(contents).map_err(|e| {
            GossError::persistence(format!("Failed to write {}: {}", target.display(), e))
        })?;
        temp.persist(&target).map_err(|e| {
            GossError::persistence(format!("Failed to replace {}: {}", target.display(), e))
        })?;
        Ok(())
    }
}
