//! Curated gossip feed roster
//!
//! Sources are grouped into importance tiers that weight every mention
//! extracted from their articles: tier 3 for gossip-native outlets,
//! tier 2 for entertainment desks, tier 1 for spillover coverage.

/// A gossip source feed definition
#[derive(Debug, Clone)]
pub struct GossipFeed {
    /// Display name of the source
    pub name: String,
    /// RSS/Atom feed URL
    pub url: String,
    /// Importance tier, 1-3; multiplies every mention from this source
    pub weight: u32,
}

impl GossipFeed {
    pub fn new(name: &str, url: &str, weight: u32) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            weight,
        }
    }

    /// Stable source identifier: lowercased name with underscores
    /// (e.g. "Page Six" -> "page_six")
    pub fn source_id(&self) -> String {
        self.name
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect::<String>()
            .split('_')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("_")
    }
}

/// Curated list of gossip source feeds
pub fn curated_feeds() -> Vec<GossipFeed> {
    vec![
        // Tier 3: gossip-native outlets
        GossipFeed::new("TMZ", "https://www.tmz.com/rss.xml", 3),
        GossipFeed::new("Perez Hilton", "https://perezhilton.com/feed/", 3),
        GossipFeed::new("Just Jared", "http://www.justjared.com/feed/", 3),
        GossipFeed::new(
            "E News",
            "https://www.eonline.com/syndication/feeds/rssfeeds/topstories.xml",
            3,
        ),
        GossipFeed::new("People", "https://people.com/feed/", 3),
        GossipFeed::new("Entertainment Tonight", "https://www.etonline.com/news/rss", 3),
        GossipFeed::new("Us Weekly", "https://www.usmagazine.com/feed/", 3),
        // Tier 2: entertainment desks
        GossipFeed::new("Variety", "https://variety.com/feed/", 2),
        GossipFeed::new(
            "Hollywood Reporter",
            "https://www.hollywoodreporter.com/feed/",
            2,
        ),
        GossipFeed::new("Deadline", "https://deadline.com/feed/", 2),
        GossipFeed::new("Page Six", "https://pagesix.com/feed/", 2),
        GossipFeed::new("Rolling Stone", "https://www.rollingstone.com/feed/", 2),
        GossipFeed::new("Billboard", "https://www.billboard.com/feed/", 2),
        GossipFeed::new("Elle", "https://www.elle.com/rss/all.xml/", 2),
        GossipFeed::new("Vogue", "https://www.vogue.com/feed/rss", 2),
        // Tier 1: spillover coverage (celebrity stories surface here too)
        GossipFeed::new("Pitchfork", "https://pitchfork.com/feed/news/rss/", 1),
        GossipFeed::new("ESPN", "https://www.espn.com/espn/rss/news", 1),
        GossipFeed::new(
            "BBC Entertainment",
            "http://feeds.bbci.co.uk/news/entertainment_and_arts/rss.xml",
            1,
        ),
    ]
}
