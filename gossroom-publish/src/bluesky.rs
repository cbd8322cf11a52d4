//! Bluesky republisher
//!
//! Picks the highest-drama recent stories that have not been posted
//! yet, composes a short teaser with a link back to the site, and
//! creates the post through the AT Protocol XRPC endpoints. The posted
//! ledger is only updated after the server accepts a record, so a
//! failed run never burns a story.

use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use gossroom_core::{Article, GossError, GossResult, PostedLedger};

use crate::post::{humanize_id, primary_celebrity, slugify, PostFrontMatter};

/// XRPC endpoint root
const BLUESKY_BASE_URL: &str = "https://bsky.social/xrpc";
/// Public site posts link back to
const SITE_BASE_URL: &str = "https://thegossroom.com";
/// Bluesky's hard post length limit in characters
pub const BLUESKY_CHAR_LIMIT: usize = 300;
/// Title excerpt length inside the post text
const TITLE_CHARS: usize = 100;
/// Only stories this recent are considered
pub const REPUBLISH_WINDOW_HOURS: i64 = 72;
/// Minimum drama score worth republishing
pub const MIN_REPUBLISH_DRAMA: f64 = 5.0;
/// Records created per run
pub const MAX_POSTS_PER_RUN: usize = 1;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// App-password credentials, read from the environment
#[derive(Debug, Clone)]
pub struct BlueskyCredentials {
    pub handle: String,
    pub password: String,
}

impl BlueskyCredentials {
    /// Read `BLUESKY_HANDLE` and `BLUESKY_PASSWORD`. `None` when either
    /// is unset, which disables the republish step.
    pub fn from_env() -> Option<Self> {
        let handle = env::var("BLUESKY_HANDLE").ok()?;
        let password = env::var("BLUESKY_PASSWORD").ok()?;
        if handle.is_empty() || password.is_empty() {
            return None;
        }
        Some(Self { handle, password })
    }
}

#[derive(Debug, Serialize)]
struct CreateSessionRequest<'a> {
    identifier: &'a str,
    password: &'a str,
}

/// Session returned by createSession; only the fields we use
#[derive(Debug, Clone, Deserialize)]
pub struct BlueskySession {
    pub did: String,
    #[serde(rename = "accessJwt")]
    pub access_jwt: String,
}

#[derive(Debug, Serialize)]
struct CreateRecordRequest<'a> {
    repo: &'a str,
    collection: &'a str,
    record: PostRecord<'a>,
}

#[derive(Debug, Serialize)]
struct PostRecord<'a> {
    #[serde(rename = "$type")]
    record_type: &'a str,
    text: &'a str,
    #[serde(rename = "createdAt")]
    created_at: String,
}

/// XRPC client for session auth and record creation
pub struct BlueskyClient {
    client: Client,
    base_url: String,
    credentials: BlueskyCredentials,
}

impl BlueskyClient {
    pub fn new(credentials: BlueskyCredentials) -> Self {
        let client = Client::builder()
            .timeout(StdDuration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: BLUESKY_BASE_URL.to_string(),
            credentials,
        }
    }

    /// Exchange handle and app password for an access JWT
    #[instrument(skip(self), fields(handle = %self.credentials.handle))]
    pub async fn create_session(&self) -> GossResult<BlueskySession> {
        let request = CreateSessionRequest {
            identifier: &self.credentials.handle,
            password: &self.credentials.password,
        };

        let response = self
            .client
            .post(format!("{}/com.atproto.server.createSession", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| GossError::publish(format!("bluesky auth request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(GossError::publish(format!(
                "bluesky auth failed with status {}",
                status.as_u16()
            )));
        }

        let session: BlueskySession = response
            .json()
            .await
            .map_err(|e| GossError::publish(format!("bluesky session body: {}", e)))?;
        info!("bluesky session established");
        Ok(session)
    }

    /// Create one app.bsky.feed.post record
    #[instrument(skip(self, session, text))]
    pub async fn create_post(
        &self,
        session: &BlueskySession,
        text: &str,
        created_at: DateTime<Utc>,
    ) -> GossResult<()> {
        let request = CreateRecordRequest {
            repo: &session.did,
            collection: "app.bsky.feed.post",
            record: PostRecord {
                record_type: "app.bsky.feed.post",
                text,
                created_at: created_at.to_rfc3339_opts(SecondsFormat::Micros, true),
            },
        };

        let response = self
            .client
            .post(format!("{}/com.atproto.repo.createRecord", self.base_url))
            .bearer_auth(&session.access_jwt)
            .json(&request)
            .send()
            .await
            .map_err(|e| GossError::publish(format!("bluesky post request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(GossError::publish(format!(
                "bluesky post failed with status {}",
                status.as_u16()
            )));
        }
        Ok(())
    }

    /// Post the best unposted candidates from the batch. Each ledger
    /// entry is recorded only after its record is accepted; the caller
    /// persists the ledger afterwards either way.
    #[instrument(skip(self, articles, ledger))]
    pub async fn republish(
        &self,
        articles: &[Article],
        ledger: &mut PostedLedger,
        now: DateTime<Utc>,
    ) -> GossResult<usize> {
        let candidates = select_candidates(articles, ledger, now);
        if candidates.is_empty() {
            info!("no republish candidates this run");
            return Ok(0);
        }
        debug!(candidates = candidates.len(), "republish candidates selected");

        let session = self.create_session().await?;
        let mut posted = 0;
        for article in candidates.into_iter().take(MAX_POSTS_PER_RUN) {
            let text = compose_post_text(article);
            self.create_post(&session, &text, now).await?;
            ledger.record(article.fingerprint.clone(), now);
            posted += 1;
            info!(
                title = %article.raw_title,
                drama_score = article.drama_score,
                "republished to bluesky"
            );
        }
        Ok(posted)
    }
}

/// Stories eligible for republishing: recent, dramatic enough, not
/// already posted. Ordered by drama score then recency, both
/// descending.
pub fn select_candidates<'a>(
    articles: &'a [Article],
    posted: &PostedLedger,
    now: DateTime<Utc>,
) -> Vec<&'a Article> {
    let cutoff = now - Duration::hours(REPUBLISH_WINDOW_HOURS);
    let mut candidates: Vec<&Article> = articles
        .iter()
        .filter(|a| a.published_at >= cutoff)
        .filter(|a| a.drama_score >= MIN_REPUBLISH_DRAMA)
        .filter(|a| !posted.contains(&a.fingerprint))
        .collect();
    candidates.sort_by(|a, b| {
        b.drama_score
            .total_cmp(&a.drama_score)
            .then_with(|| b.published_at.cmp(&a.published_at))
    });
    candidates
}

/// Teaser text for one story, hard-capped at the platform limit
pub fn compose_post_text(article: &Article) -> String {
    let header = drama_header(article.drama_score);
    let mut text = format!("{}\n\n", header);

    if let Some(primary) = primary_celebrity(&article.mentions) {
        text.push_str(&format!("🎯 {}\n", humanize_id(primary)));
    }
    text.push_str(&format!("📊 Drama Score: {}\n\n", article.drama_score));

    let title = truncate_chars(&article.raw_title, TITLE_CHARS);
    text.push_str(&format!("📰 {}\n\n", title));
    text.push_str(&format!("🔗 {}\n\n", site_url(article)));
    text.push_str("#CelebrityGossip #Drama #Entertainment #TheGossipRoom");

    if text.chars().count() > BLUESKY_CHAR_LIMIT {
        text.chars().take(BLUESKY_CHAR_LIMIT).collect()
    } else {
        text
    }
}

/// Emoji header by drama tier
fn drama_header(drama_score: f64) -> &'static str {
    if drama_score >= 40.0 {
        "🔥🔥🔥 EXPLOSIVE"
    } else if drama_score >= 25.0 {
        "🔥🔥 HOT DRAMA"
    } else if drama_score >= 15.0 {
        "🔥 HEATING UP"
    } else if drama_score >= 10.0 {
        "🎭 DRAMA ALERT"
    } else {
        "📰 BREAKING"
    }
}

/// Permalink on the public site, mirroring the post writer's layout
pub fn site_url(article: &Article) -> String {
    format!(
        "{}/gossip/{}/{}.html",
        SITE_BASE_URL,
        article.published_at.format("%Y/%m/%d"),
        slugify(&article.raw_title)
    )
}

/// Rebuild republish candidates from post files written inside the
/// window, walking the writer's `YYYY/MM/DD` layout backwards from
/// `now`. Unreadable files are skipped with a warning.
pub fn scan_recent_posts(root: &Path, now: DateTime<Utc>) -> Vec<Article> {
    let mut articles = Vec::new();
    let days_back = REPUBLISH_WINDOW_HOURS / 24 + 1;
    for offset in 0..=days_back {
        let day = (now - Duration::days(offset)).format("%Y/%m/%d").to_string();
        let entries = match fs::read_dir(root.join(day)) {
            Ok(entries) => entries,
            Err(_) => continue,
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().map_or(true, |ext| ext != "md") {
                continue;
            }
            match read_post_article(&path) {
                Some(article) => articles.push(article),
                None => warn!(path = %path.display(), "unreadable post file, skipping"),
            }
        }
    }
    debug!(found = articles.len(), "scanned recent posts");
    articles
}

/// Republish view of a written post. Body and normalized title are not
/// stored in front matter and stay empty; selection and composition do
/// not use them.
fn read_post_article(path: &Path) -> Option<Article> {
    let content = fs::read_to_string(path).ok()?;
    let front = parse_front_matter(&content)?;
    let published_at = DateTime::parse_from_str(&front.date, "%Y-%m-%d %H:%M:%S %z")
        .ok()?
        .with_timezone(&Utc);
    Some(Article {
        raw_title: front.title,
        raw_body: String::new(),
        source_id: front.source,
        source_weight: 1,
        published_at,
        origin_url: front.source_url,
        normalized_title: String::new(),
        fingerprint: front.fingerprint,
        mentions: front.mentions,
        drama_score: front.drama_score,
        celebrities: front.celebrities,
    })
}

fn parse_front_matter(content: &str) -> Option<PostFrontMatter> {
    let rest = content.strip_prefix("---\n")?;
    let end = rest.find("\n---\n")?;
    serde_yaml::from_str(&rest[..end]).ok()
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let cut: String = s.chars().take(max).collect();
        format!("{}...", cut)
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use gossroom_core::RawArticle;
    use indexmap::IndexMap;

    fn article(title: &str, drama: f64, published_at: DateTime<Utc>) -> Article {
        let raw = RawArticle {
            title: title.to_string(),
            body: "details".to_string(),
            source_id: "tmz".to_string(),
            source_weight: 3,
            published_at,
            origin_url: "https://tmz.example.com/story".to_string(),
        };
        let mut article = Article::from_raw(raw, title.to_lowercase());
        let mut mentions = IndexMap::new();
        mentions.insert("taylor_swift".to_string(), drama);
        article.set_mentions(mentions, vec!["Taylor Swift".to_string()]);
        article
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_select_filters_window_drama_and_posted() {
        let now = now();
        let fresh = article("Fresh feud", 8.0, now - Duration::hours(10));
        let stale = article("Old news", 9.0, now - Duration::hours(80));
        let mild = article("Mild sighting", 3.0, now - Duration::hours(5));
        let reposted = article("Already out", 7.0, now - Duration::hours(2));

        let mut ledger = PostedLedger::new();
        ledger.record(reposted.fingerprint.clone(), now);

        let articles = vec![fresh.clone(), stale, mild, reposted];
        let selected = select_candidates(&articles, &ledger, now);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].fingerprint, fresh.fingerprint);
    }

    #[test]
    fn test_select_orders_by_drama_then_recency() {
        let now = now();
        let low = article("Low drama", 6.0, now - Duration::hours(1));
        let high_old = article("High but older", 9.0, now - Duration::hours(40));
        let high_new = article("High and fresh", 9.0, now - Duration::hours(3));

        let articles = vec![low.clone(), high_old.clone(), high_new.clone()];
        let ledger = PostedLedger::new();
        let selected = select_candidates(&articles, &ledger, now);
        assert_eq!(selected.len(), 3);
        assert_eq!(selected[0].fingerprint, high_new.fingerprint);
        assert_eq!(selected[1].fingerprint, high_old.fingerprint);
        assert_eq!(selected[2].fingerprint, low.fingerprint);
    }

    #[test]
    fn test_compose_post_text_tiers_and_limit() {
        let now = now();
        let hot = article("Taylor Swift spotted at courthouse", 27.0, now);
        let text = compose_post_text(&hot);
        assert!(text.starts_with("🔥🔥 HOT DRAMA"));
        assert!(text.contains("🎯 Taylor Swift"));
        assert!(text.contains("📊 Drama Score: 27"));
        assert!(text.contains("#CelebrityGossip"));
        assert!(text.chars().count() <= BLUESKY_CHAR_LIMIT);

        let explosive = article("Explosive", 45.0, now);
        assert!(compose_post_text(&explosive).starts_with("🔥🔥🔥 EXPLOSIVE"));

        let breaking = article("Breaking", 6.0, now);
        assert!(compose_post_text(&breaking).starts_with("📰 BREAKING"));
    }

    #[test]
    fn test_compose_post_text_truncates_long_titles() {
        let now = now();
        let long_title = "Drama ".repeat(60);
        let a = article(&long_title, 12.0, now);
        let text = compose_post_text(&a);
        assert!(text.chars().count() <= BLUESKY_CHAR_LIMIT);
    }

    #[test]
    fn test_site_url_matches_post_layout() {
        let now = now();
        let a = article("Kim & Kanye: SHOCKING Split!!!", 8.0, now);
        assert_eq!(
            site_url(&a),
            "https://thegossroom.com/gossip/2025/06/15/kim-kanye-shocking-split.html"
        );
    }

    #[test]
    fn test_scan_recent_posts_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let writer = crate::post::PostWriter::new(dir.path());
        let now = now();
        let a = article("Taylor Swift courthouse drama", 9.0, now - Duration::hours(5));
        writer.write_all(std::slice::from_ref(&a)).unwrap();

        let scanned = scan_recent_posts(dir.path(), now);
        assert_eq!(scanned.len(), 1);
        assert_eq!(scanned[0].fingerprint, a.fingerprint);
        assert_eq!(scanned[0].drama_score, 9.0);
        assert_eq!(scanned[0].published_at, a.published_at);
        assert_eq!(scanned[0].celebrities, vec!["Taylor Swift".to_string()]);

        // Scanned posts are full republish candidates
        let ledger = PostedLedger::new();
        let selected = select_candidates(&scanned, &ledger, now);
        assert_eq!(selected.len(), 1);
    }

    #[test]
    fn test_credentials_absent_from_env() {
        // Neither variable set in the test environment
        std::env::remove_var("BLUESKY_HANDLE");
        std::env::remove_var("BLUESKY_PASSWORD");
        assert!(BlueskyCredentials::from_env().is_none());
    }

    #[tokio::test]
    async fn test_republish_empty_batch_never_authenticates() {
        // With no candidates the client must return before any network
        // call, so this passes offline with fake credentials
        let client = BlueskyClient::new(BlueskyCredentials {
            handle: "gossroom.test".to_string(),
            password: "app-password".to_string(),
        });
        let mut ledger = PostedLedger::new();

        let posted = client.republish(&[], &mut ledger, now()).await.unwrap();
        assert_eq!(posted, 0);
        assert!(ledger.is_empty());
    }
}
