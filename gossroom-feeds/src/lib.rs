//! Feed ingestion for the Gossroom pipeline
//!
//! This crate fetches the curated gossip feed roster over HTTP, parses
//! RSS 2.0 with an Atom fallback, cleans the HTML out of titles and
//! summaries, and hands the result to the engine as plain `RawArticle`
//! values. One unreachable source never fails the batch.

pub mod client;
pub mod error;
pub mod feeds;
pub mod html;

pub use client::{FeedClient, FetchOutcome};
pub use error::FeedError;
pub use feeds::{curated_feeds, GossipFeed};
pub use html::clean_text;
