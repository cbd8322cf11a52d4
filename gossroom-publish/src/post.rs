//! Markdown post generation
//!
//! One post file per accepted, deduplicated article, written under
//! `posts/YYYY/MM/DD/<slug>.md`. Front matter is a typed record
//! serialized in one shot with serde_yaml rather than assembled by
//! string formatting, so quoting and escaping are never hand-rolled.
//! A post whose file already exists is skipped, which makes reruns
//! over the same batch idempotent.

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use gossroom_core::{Article, GossError, GossResult};

/// Body excerpt length in characters
const POST_BODY_CHARS: usize = 500;
/// Maximum slug length before hyphen trimming
const SLUG_MAX_CHARS: usize = 50;
/// Slug used when a title reduces to nothing
const FALLBACK_SLUG: &str = "untitled-post";

/// Front matter for a generated post. Field order is serialization
/// order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostFrontMatter {
    pub layout: String,
    pub title: String,
    pub date: String,
    pub slug: String,
    /// Dedup fingerprint, carried so the republisher can match posts
    /// on disk against its ledger
    pub fingerprint: String,
    pub categories: Vec<String>,
    /// Display names of every mentioned entity
    pub celebrities: Vec<String>,
    pub tags: Vec<String>,
    pub drama_score: f64,
    /// Entity id with the highest mention weight
    pub primary_celebrity: String,
    pub source: String,
    pub source_url: String,
    /// entity_id -> weighted mention count
    pub mentions: IndexMap<String, f64>,
}

impl PostFrontMatter {
    /// Build front matter for an article. Returns `None` when the
    /// article carries no mentions, which the pipeline should not
    /// produce for accepted articles.
    pub fn from_article(article: &Article) -> Option<Self> {
        let primary = primary_celebrity(&article.mentions)?;
        let level = drama_level(article.drama_score);

        let mut tags: Vec<String> = article
            .celebrities
            .iter()
            .map(|name| normalize_tag(name))
            .collect();
        tags.push(normalize_tag(&format!("source_{}", article.source_id)));
        tags.push(normalize_tag(&format!("drama_{}", level)));

        // Drop empties, single chars, and duplicates, first-wins
        let mut seen = HashSet::new();
        tags.retain(|t| t.len() > 1 && seen.insert(t.clone()));

        Some(Self {
            layout: "post".to_string(),
            title: article.raw_title.clone(),
            date: article.published_at.format("%Y-%m-%d %H:%M:%S %z").to_string(),
            slug: slugify(&article.raw_title),
            fingerprint: article.fingerprint.clone(),
            categories: vec!["gossip".to_string()],
            celebrities: article.celebrities.clone(),
            tags,
            drama_score: article.drama_score,
            primary_celebrity: primary.to_string(),
            source: article.source_id.clone(),
            source_url: article.origin_url.clone(),
            mentions: article.mentions.clone(),
        })
    }
}

/// Highest-weight entity id, first-wins on ties
pub(crate) fn primary_celebrity(mentions: &IndexMap<String, f64>) -> Option<&str> {
    let mut best: Option<(&str, f64)> = None;
    for (id, weight) in mentions {
        match best {
            Some((_, w)) if *weight <= w => {}
            _ => best = Some((id.as_str(), *weight)),
        }
    }
    best.map(|(id, _)| id)
}

/// Title to URL slug: strip everything but alphanumerics and spaces,
/// hyphenate, lowercase, cap at 50 chars, trim stray hyphens.
pub fn slugify(title: &str) -> String {
    let stripped: String = title
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect();
    let mut slug = stripped
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase();
    slug.truncate(SLUG_MAX_CHARS);
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug.to_string()
    }
}

/// Canonical tag form: lowercase, alphanumerics only, separator runs
/// collapsed to a single underscore.
pub fn normalize_tag(tag: &str) -> String {
    let lowered = tag.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut prev_sep = false;
    for c in lowered.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            out.push(c);
            prev_sep = false;
        } else if c.is_whitespace() || c == '-' || c == '_' {
            if !prev_sep && !out.is_empty() {
                out.push('_');
            }
            prev_sep = true;
        }
        // any other character is dropped without becoming a separator
    }
    out.trim_end_matches('_').to_string()
}

/// Drama tier label for tagging and the post footer
pub fn drama_level(drama_score: f64) -> &'static str {
    if drama_score >= 10.0 {
        "explosive"
    } else if drama_score >= 5.0 {
        "hot"
    } else if drama_score >= 2.0 {
        "rising"
    } else {
        "mild"
    }
}

/// Render the complete post file: front matter document plus body
pub fn render_post(article: &Article, front: &PostFrontMatter) -> GossResult<String> {
    let yaml = serde_yaml::to_string(front)
        .map_err(|e| GossError::internal(format!("serialize front matter: {}", e)))?;

    let excerpt = body_excerpt(&article.raw_body);
    let level = drama_level(article.drama_score);
    let names = article.celebrities.join(", ");

    Ok(format!(
        "---\n{yaml}---\n\n{excerpt}\n\n\
         **Drama Score:** {score} | **Level:** {level_upper}\n\n\
         **Celebrities Mentioned:** {names}\n\n\
         [Read full article at {source}]({url})\n\n\
         ---\n*Generated from gossip feeds. Drama scores reflect mention \
         frequency and source weight.*\n",
        yaml = yaml,
        excerpt = excerpt,
        score = article.drama_score,
        level_upper = level.to_uppercase(),
        names = names,
        source = humanize_id(&article.source_id),
        url = article.origin_url,
    ))
}

fn body_excerpt(body: &str) -> String {
    if body.chars().count() > POST_BODY_CHARS {
        let cut: String = body.chars().take(POST_BODY_CHARS).collect();
        format!("{}...", cut)
    } else {
        body.to_string()
    }
}

/// Snake_case id to display form: "deuxmoi_feed" -> "Deuxmoi Feed"
pub(crate) fn humanize_id(id: &str) -> String {
    id.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Counts from one post-generation pass
#[derive(Debug, Default, Clone, Copy)]
pub struct PostReport {
    pub written: usize,
    pub skipped_existing: usize,
}

/// Writes post files under a root directory, dated by publication day
pub struct PostWriter {
    root: PathBuf,
}

impl PostWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Target path for an article: `<root>/YYYY/MM/DD/<slug>.md`
    pub fn post_path(&self, article: &Article) -> PathBuf {
        let day = article.published_at.format("%Y/%m/%d").to_string();
        self.root
            .join(day)
            .join(format!("{}.md", slugify(&article.raw_title)))
    }

    /// Write one post per article, skipping files that already exist.
    /// Articles without mentions are logged and skipped.
    #[instrument(skip(self, articles))]
    pub fn write_all(&self, articles: &[Article]) -> GossResult<PostReport> {
        let mut report = PostReport::default();
        for article in articles {
            let Some(front) = PostFrontMatter::from_article(article) else {
                warn!(title = %article.raw_title, "article has no mentions, not writing a post");
                continue;
            };
            let path = self.post_path(article);
            if path.exists() {
                debug!(path = %path.display(), "post already on disk");
                report.skipped_existing += 1;
                continue;
            }
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| {
                    GossError::publish(format!("create {}: {}", parent.display(), e))
                })?;
            }
            let content = render_post(article, &front)?;
            fs::write(&path, content)
                .map_err(|e| GossError::publish(format!("write {}: {}", path.display(), e)))?;
            report.written += 1;
        }
        info!(
            written = report.written,
            skipped_existing = report.skipped_existing,
            "post generation finished"
        );
        Ok(report)
    }
}
