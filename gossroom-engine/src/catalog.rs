//! Name catalog: known entities and their searchable aliases
//!
//! Built once per run from the roster and read-only for the duration of
//! the run. Memorial and retired entities are left out of the scan set
//! entirely, so their aliases contribute nothing.

use std::collections::HashMap;

use regex::Regex;

use gossroom_core::{Entity, GossError, GossResult};

/// Aliases shorter than this are rejected; they produce excessive false
/// positives in boundary matching
pub const MIN_ALIAS_CHARS: usize = 3;

/// One entity's compiled scan patterns
pub struct CatalogEntry {
    pub entity_id: String,
    pub display_name: String,
    /// Temperature snapshot at catalog build time, drives the profile
    /// amplifier during extraction
    pub temperature: f64,
    patterns: Vec<(String, Regex)>,
}

impl CatalogEntry {
    /// Count non-overlapping mention occurrences in `text`.
    ///
    /// Match ranges from all of this entity's aliases are merged before
    /// counting, so an alias that is a substring of a longer alias
    /// ("Kardashian" inside "Kim Kardashian") cannot count the same
    /// literal occurrence twice.
    pub fn count_mentions(&self, text: &str) -> usize {
        let mut ranges: Vec<(usize, usize)> = Vec::new();
        for (_, pattern) in &self.patterns {
            for m in pattern.find_iter(text) {
                ranges.push((m.start(), m.end()));
            }
        }
        if ranges.is_empty() {
            return 0;
        }

        ranges.sort_unstable();
        let mut merged = 0usize;
        let mut current_end = 0usize;
        for (start, end) in ranges {
            if merged == 0 || start >= current_end {
                merged += 1;
                current_end = end;
            } else if end > current_end {
                current_end = end;
            }
        }
        merged
    }

    /// Alias surface forms registered for this entity
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|(alias, _)| alias.as_str())
    }
}

/// The set of known entities and their searchable aliases
#[derive(Default)]
pub struct NameCatalog {
    entries: Vec<CatalogEntry>,
    /// lowercased alias -> entity_id, for collision detection
    alias_owner: HashMap<String, String>,
}

impl NameCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the catalog from a roster, skipping memorial/retired
    /// entities. The canonical name is registered as an alias alongside
    /// the explicit alias list.
    pub fn from_roster(roster: &[Entity]) -> GossResult<Self> {
        let mut catalog = Self::new();
        for entity in roster.iter().filter(|e| e.is_scorable()) {
            catalog.register_with_temperature(
                &entity.id,
                &entity.name,
                &entity.aliases,
                entity.temperature,
            )?;
        }
        Ok(catalog)
    }

    /// Register an entity with its canonical name and aliases
    pub fn register(
        &mut self,
        entity_id: &str,
        canonical_name: &str,
        aliases: &[String],
    ) -> GossResult<()> {
        self.register_with_temperature(entity_id, canonical_name, aliases, 0.0)
    }

    fn register_with_temperature(
        &mut self,
        entity_id: &str,
        canonical_name: &str,
        aliases: &[String],
        temperature: f64,
    ) -> GossResult<()> {
        if entity_id.is_empty() {
            return Err(GossError::config("entity id must not be empty"));
        }
        if self.entries.iter().any(|e| e.entity_id == entity_id) {
            return Err(GossError::config(format!(
                "entity '{}' registered twice",
                entity_id
            )));
        }

        let mut patterns = Vec::new();
        let mut seen_forms: Vec<String> = Vec::new();
        for form in std::iter::once(canonical_name).chain(aliases.iter().map(|a| a.as_str())) {
            let trimmed = form.trim();
            if trimmed.is_empty() {
                return Err(GossError::config(format!(
                    "entity '{}' has an empty alias",
                    entity_id
                )));
            }
            if trimmed.chars().count() < MIN_ALIAS_CHARS {
                return Err(GossError::config(format!(
                    "alias '{}' for entity '{}' is shorter than {} characters",
                    trimmed, entity_id, MIN_ALIAS_CHARS
                )));
            }

            let lowered = trimmed.to_lowercase();
            if let Some(owner) = self.alias_owner.get(&lowered) {
                return Err(GossError::config(format!(
                    "alias '{}' is claimed by both '{}' and '{}'",
                    trimmed, owner, entity_id
                )));
            }
            // Same alias repeated within one entity is harmless
            if seen_forms.contains(&lowered) {
                continue;
            }

            let pattern = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(trimmed)))
                .map_err(|e| GossError::config(format!("alias '{}': {}", trimmed, e)))?;
            patterns.push((trimmed.to_string(), pattern));
            seen_forms.push(lowered);
        }

        for lowered in &seen_forms {
            self.alias_owner
                .insert(lowered.clone(), entity_id.to_string());
        }
        self.entries.push(CatalogEntry {
            entity_id: entity_id.to_string(),
            display_name: canonical_name.to_string(),
            temperature,
            patterns,
        });
        Ok(())
    }

    /// Every (entity_id, alias) pair in the catalog
    pub fn all_aliases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .flat_map(|e| e.aliases().map(move |a| (e.entity_id.as_str(), a)))
    }

    /// Display name for an entity, if registered
    pub fn display_name(&self, entity_id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.entity_id == entity_id)
            .map(|e| e.display_name.as_str())
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
