//! Core types for the Gossroom drama pipeline
//!
//! This crate defines the shared data structures used across the
//! pipeline: tracked entities with their temperature and lifecycle,
//! ingested articles with fingerprints and mention annotations, and the
//! pipeline-wide error taxonomy.

pub mod article;
pub mod entity;
pub mod error;
pub mod posted;

pub use article::{fingerprint, Article, RawArticle};
pub use entity::{
    Entity, EntityStatus, LifecycleState, MEMORIAL_RETENTION_DAYS, NEW_ENTITY_PROMOTION_DAYS,
    TEMPERATURE_MAX, TEMPERATURE_MIN,
};
pub use error::{GossError, GossResult};
pub use posted::{PostedLedger, PostedRecord, POSTED_LEDGER_CAP};
