//! Mention extraction
//!
//! Scans article text for catalog aliases with whole-word,
//! case-insensitive matching and returns weighted per-entity hit counts.

use indexmap::IndexMap;

use crate::catalog::NameCatalog;

/// Upper bound on the profile amplifier
const MAX_PROFILE_AMPLIFIER: f64 = 2.0;

/// Extracts weighted mention counts against a catalog
pub struct MentionExtractor<'a> {
    catalog: &'a NameCatalog,
}

impl<'a> MentionExtractor<'a> {
    pub fn new(catalog: &'a NameCatalog) -> Self {
        Self { catalog }
    }

    /// Count weighted mentions of every catalog entity in `text`.
    ///
    /// Each raw occurrence count is multiplied by the source weight and
    /// by a bounded profile amplifier `1 + temperature/100`, so already
    /// hot entities accumulate heat a little faster. Empty or
    /// whitespace-only text yields an empty map.
    pub fn extract(&self, text: &str, source_weight: u32) -> IndexMap<String, f64> {
        let mut mentions = IndexMap::new();
        if text.trim().is_empty() {
            return mentions;
        }

        for entry in self.catalog.entries() {
            let count = entry.count_mentions(text);
            if count == 0 {
                continue;
            }
            let amplifier = (1.0 + entry.temperature / 100.0).min(MAX_PROFILE_AMPLIFIER);
            let weighted = count as f64 * source_weight as f64 * amplifier;
            mentions.insert(entry.entity_id.clone(), weighted);
        }
        mentions
    }

    /// Display names for a set of mentioned entity ids, in mention order
    pub fn display_names(&self, mentions: &IndexMap<String, f64>) -> Vec<String> {
        mentions
            .keys()
            .filter_map(|id| self.catalog.display_name(id))
            .map(|s| s.to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> NameCatalog {
        let mut catalog = NameCatalog::new();
        catalog.register("drake", "Drake", &[]).unwrap();
        catalog
            .register(
                "taylor_swift",
                "Taylor Swift",
                &["TSwift".to_string(), "Swift".to_string()],
            )
            .unwrap();
        catalog
    }

    #[test]
    fn test_extract_case_insensitive_boundary() {
        let catalog = catalog();
        let extractor = MentionExtractor::new(&catalog);
        let mentions = extractor.extract("Drake's new album dropped. drake wins.", 1);
        assert_eq!(mentions.get("drake"), Some(&2.0));

        let mentions = extractor.extract("Drakey is someone else", 1);
        assert!(mentions.get("drake").is_none());
    }

    #[test]
    fn test_extract_applies_source_weight() {
        let catalog = catalog();
        let extractor = MentionExtractor::new(&catalog);
        let mentions = extractor.extract("Taylor Swift arrives", 3);
        // one merged occurrence ("Taylor Swift" subsumes "Swift") x weight 3
        assert_eq!(mentions.get("taylor_swift"), Some(&3.0));
    }

    #[test]
    fn test_extract_profile_amplifier_bounded() {
        let mut hot = gossroom_core::Entity::new("hot", "Hot Star");
        hot.record_temperature(100.0);
        let roster = vec![gossroom_core::Entity::new("cold_star", "Cold Star"), hot];
        let catalog = NameCatalog::from_roster(&roster).unwrap();
        let extractor = MentionExtractor::new(&catalog);

        let mentions = extractor.extract("Hot Star and Cold Star both appear", 2);
        // amplifier 2.0 at temperature 100, 1.0 at temperature 0
        assert_eq!(mentions.get("hot"), Some(&4.0));
        assert_eq!(mentions.get("cold_star"), Some(&2.0));
    }

    #[test]
    fn test_extract_empty_text() {
        let catalog = catalog();
        let extractor = MentionExtractor::new(&catalog);
        assert!(extractor.extract("", 3).is_empty());
        assert!(extractor.extract("   \n ", 3).is_empty());
    }

    #[test]
    fn test_display_names_follow_mention_order() {
        let catalog = catalog();
        let extractor = MentionExtractor::new(&catalog);
        let mentions = extractor.extract("Drake met Taylor Swift", 1);
        assert_eq!(
            extractor.display_names(&mentions),
            vec!["Drake".to_string(), "Taylor Swift".to_string()]
        );
    }
}
