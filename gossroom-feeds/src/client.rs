//! Feed client for gossip source ingestion
//!
//! Fetches and parses RSS/Atom feeds from the curated sources. A failing
//! source is logged and skipped; the batch never aborts on one bad feed.

use chrono::{DateTime, Utc};
use reqwest::Client;
use tracing::{debug, info, warn};

use gossroom_core::RawArticle;

use crate::error::FeedError;
use crate::feeds::{curated_feeds, GossipFeed};
use crate::html::clean_text;

/// Per-source fetch timeout
const FETCH_TIMEOUT_SECS: u64 = 10;
/// Entries taken per feed; gossip feeds are chatty
const MAX_ENTRIES_PER_FEED: usize = 20;
/// Items older than this are dropped at ingest; the pipeline runs hourly
/// and the seen cache covers re-delivery
const MAX_ITEM_AGE_HOURS: i64 = 24;

const USER_AGENT: &str = "Gossroom/1.0 (+https://thegossroom.com)";

/// Result of fetching the whole roster
#[derive(Debug, Default)]
pub struct FetchOutcome {
    /// All raw articles, newest first
    pub articles: Vec<RawArticle>,
    /// Feeds that fetched and parsed successfully
    pub feeds_ok: usize,
    /// (feed name, error) for every feed that failed
    pub feeds_failed: Vec<(String, String)>,
    /// Items dropped as malformed while parsing healthy feeds
    pub items_skipped: usize,
}

/// Gossip feed client
pub struct FeedClient {
    client: Client,
    feeds: Vec<GossipFeed>,
}

impl FeedClient {
    /// Create a new client over the curated feed roster
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(FETCH_TIMEOUT_SECS))
                .build()
                .unwrap_or_else(|_| Client::new()),
            feeds: curated_feeds(),
        }
    }

    /// Create with a custom roster; every feed URL must parse
    pub fn with_feeds(feeds: Vec<GossipFeed>) -> Result<Self, FeedError> {
        for feed in &feeds {
            url::Url::parse(&feed.url)
                .map_err(|e| FeedError::InvalidConfig(format!("feed {}: {}", feed.name, e)))?;
            if !(1..=3).contains(&feed.weight) {
                return Err(FeedError::InvalidConfig(format!(
                    "feed {}: weight {} outside 1-3",
                    feed.name, feed.weight
                )));
            }
        }
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(FETCH_TIMEOUT_SECS))
                .build()
                .unwrap_or_else(|_| Client::new()),
            feeds,
        })
    }

    /// Fetch every feed in the roster, newest articles first
    pub async fn fetch_all(&self) -> FetchOutcome {
        let mut outcome = FetchOutcome::default();

        for feed in &self.feeds {
            match self.fetch_feed(feed).await {
                Ok((articles, malformed)) => {
                    debug!(
                        "Fetched {} items from {} ({} malformed)",
                        articles.len(),
                        feed.name,
                        malformed
                    );
                    outcome.feeds_ok += 1;
                    outcome.items_skipped += malformed;
                    outcome.articles.extend(articles);
                }
                Err(e) => {
                    warn!("Failed to fetch feed {}: {}", feed.name, e);
                    outcome.feeds_failed.push((feed.name.clone(), e.to_string()));
                }
            }
        }

        // Sort by date, newest first
        outcome
            .articles
            .sort_by(|a, b| b.published_at.cmp(&a.published_at));

        info!(
            "Fetched {} raw articles from {} feeds ({} failed)",
            outcome.articles.len(),
            outcome.feeds_ok,
            outcome.feeds_failed.len()
        );
        outcome
    }

    /// Fetch a single feed, returning its articles plus how many items
    /// were dropped as malformed
    async fn fetch_feed(&self, feed: &GossipFeed) -> Result<(Vec<RawArticle>, usize), FeedError> {
        let response = self
            .client
            .get(&feed.url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .map_err(|e| FeedError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FeedError::HttpStatus {
                status: response.status().as_u16(),
                message: format!("Failed to fetch {}", feed.url),
            });
        }

        let content = response
            .bytes()
            .await
            .map_err(|e| FeedError::RequestFailed(e.to_string()))?;

        // Try parsing as RSS first, then Atom
        if let Ok(channel) = rss::Channel::read_from(&content[..]) {
            return Ok(parse_rss_channel(&channel, feed));
        }

        if let Ok(atom_feed) = atom_syndication::Feed::read_from(&content[..]) {
            return Ok(parse_atom_feed(&atom_feed, feed));
        }

        Err(FeedError::ParseError(format!(
            "Failed to parse feed: {}",
            feed.url
        )))
    }
}

impl Default for FeedClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse an RSS channel into raw articles plus malformed-item count
fn parse_rss_channel(channel: &rss::Channel, feed: &GossipFeed) -> (Vec<RawArticle>, usize) {
    let source_id = feed.source_id();
    let mut articles = Vec::new();
    let mut malformed = 0usize;

    for item in channel.items() {
        if articles.len() == MAX_ENTRIES_PER_FEED {
            break;
        }

        let (title, origin_url) = match (item.title(), item.link()) {
            (Some(title), Some(link)) => (clean_text(title), link.to_string()),
            _ => {
                malformed += 1;
                continue;
            }
        };
        if title.is_empty() {
            malformed += 1;
            continue;
        }

        let published_at = item
            .pub_date()
            .and_then(|d| DateTime::parse_from_rfc2822(d).ok())
            .map(|d| d.with_timezone(&Utc))
            .or_else(|| extract_date_from_url(&origin_url))
            .unwrap_or_else(Utc::now);

        if too_old(published_at) {
            continue;
        }

        let body = clean_text(item.description().unwrap_or_default());

        articles.push(RawArticle {
            title,
            body,
            source_id: source_id.clone(),
            source_weight: feed.weight,
            published_at,
            origin_url,
        });
    }

    (articles, malformed)
}

/// Parse an Atom feed into raw articles plus malformed-item count
fn parse_atom_feed(
    atom_feed: &atom_syndication::Feed,
    feed: &GossipFeed,
) -> (Vec<RawArticle>, usize) {
    let source_id = feed.source_id();
    let mut articles = Vec::new();
    let mut malformed = 0usize;

    for entry in atom_feed.entries() {
        if articles.len() == MAX_ENTRIES_PER_FEED {
            break;
        }

        let title = clean_text(entry.title());
        let origin_url = entry
            .links()
            .first()
            .map(|l| l.href().to_string())
            .unwrap_or_default();

        if title.is_empty() || origin_url.is_empty() {
            malformed += 1;
            continue;
        }

        // Atom guarantees an updated timestamp even when published is absent
        let published_at = entry
            .published()
            .copied()
            .unwrap_or_else(|| *entry.updated())
            .with_timezone(&Utc);

        if too_old(published_at) {
            continue;
        }

        let summary_html = entry.summary().map(|s| s.as_str()).unwrap_or_default();
        let content_html = entry.content().and_then(|c| c.value()).unwrap_or_default();
        let body = if !summary_html.is_empty() {
            clean_text(summary_html)
        } else {
            clean_text(content_html)
        };

        articles.push(RawArticle {
            title,
            body,
            source_id: source_id.clone(),
            source_weight: feed.weight,
            published_at,
            origin_url,
        });
    }

    (articles, malformed)
}

fn too_old(published_at: DateTime<Utc>) -> bool {
    (Utc::now() - published_at).num_hours() > MAX_ITEM_AGE_HOURS
}

/// Extract date from URL patterns
fn extract_date_from_url(url: &str) -> Option<DateTime<Utc>> {
    // Pattern: /2025/12/09/ or /2025/12/9/
    let slash_pattern = regex::Regex::new(r"/(\d{4})/(\d{1,2})/(\d{1,2})/").ok()?;
    if let Some(caps) = slash_pattern.captures(url) {
        let year: i32 = caps.get(1)?.as_str().parse().ok()?;
        let month: u32 = caps.get(2)?.as_str().parse().ok()?;
        let day: u32 = caps.get(3)?.as_str().parse().ok()?;

        if let Some(date) = chrono::NaiveDate::from_ymd_opt(year, month, day) {
            return Some(DateTime::from_naive_utc_and_offset(
                date.and_hms_opt(12, 0, 0)?,
                Utc,
            ));
        }
    }

    // Pattern: /2025-12-09/
    let dash_pattern = regex::Regex::new(r"[/-](\d{4})-(\d{2})-(\d{2})[/-]").ok()?;
    if let Some(caps) = dash_pattern.captures(url) {
        let year: i32 = caps.get(1)?.as_str().parse().ok()?;
        let month: u32 = caps.get(2)?.as_str().parse().ok()?;
        let day: u32 = caps.get(3)?.as_str().parse().ok()?;

        if let Some(date) = chrono::NaiveDate::from_ymd_opt(year, month, day) {
            return Some(DateTime::from_naive_utc_and_offset(
                date.and_hms_opt(12, 0, 0)?,
                Utc,
            ));
        }
    }

    None
}
