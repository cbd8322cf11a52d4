//! Error types for the pipeline

use thiserror::Error;

/// Pipeline-wide error type
#[derive(Error, Debug)]
pub enum GossError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Fetch error ({source_id}): {message}")]
    Fetch { source_id: String, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Publish error: {0}")]
    Publish(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GossError {
    pub fn config(msg: impl Into<String>) -> Self {
        GossError::Config(msg.into())
    }

    pub fn fetch(source_id: impl Into<String>, message: impl Into<String>) -> Self {
        GossError::Fetch {
            source_id: source_id.into(),
            message: message.into(),
        }
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        GossError::Parse(msg.into())
    }

    pub fn persistence(msg: impl Into<String>) -> Self {
        GossError::Persistence(msg.into())
    }

    pub fn publish(msg: impl Into<String>) -> Self {
        GossError::Publish(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        GossError::Internal(msg.into())
    }

    /// Whether the error is recoverable within a run (skip and continue)
    /// rather than fatal to the whole batch.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            GossError::Fetch { .. } | GossError::Parse(_) | GossError::Publish(_)
        )
    }
}

/// Result type alias for pipeline operations
pub type GossResult<T> = Result<T, GossError>;
