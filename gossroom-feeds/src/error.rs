//! Error types for feed ingestion

use thiserror::Error;

/// Errors that can occur while fetching and parsing feeds
#[derive(Debug, Error)]
pub enum FeedError {
    /// HTTP request failed
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Source returned an error response
    #[error("HTTP error (status {status}): {message}")]
    HttpStatus {
        /// HTTP status code
        status: u16,
        /// Description of the failed request
        message: String,
    },

    /// Content was neither valid RSS nor valid Atom
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Invalid feed configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
