//! Error types for FinTrack

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// A referenced user or tester does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A unique key (tester email, user id) is already taken
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Malformed input rejected before any write
    #[error("Validation error: {0}")]
    Validation(String),

    /// An upstream service (classifier, notification channel) misbehaved.
    /// Recovered locally; never surfaced to the caller of the triggering request.
    #[error("External service error: {0}")]
    External(String),
}

impl Error {
    /// Whether this error came from an upstream service rather than local state
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Http(_) | Self::External(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
