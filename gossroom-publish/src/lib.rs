//! Publishing surfaces for the Gossroom pipeline
//!
//! Two outputs: markdown post files with typed YAML front matter, and
//! short Bluesky teasers for the highest-drama stories. Both are
//! idempotent across reruns; posts skip files already on disk and the
//! republisher consults the posted ledger.

pub mod bluesky;
pub mod post;

pub use bluesky::{
    compose_post_text, scan_recent_posts, select_candidates, site_url, BlueskyClient,
    BlueskyCredentials, BlueskySession, BLUESKY_CHAR_LIMIT, MAX_POSTS_PER_RUN,
    MIN_REPUBLISH_DRAMA, REPUBLISH_WINDOW_HOURS,
};
pub use post::{
    drama_level, normalize_tag, render_post, slugify, PostFrontMatter, PostReport, PostWriter,
};
