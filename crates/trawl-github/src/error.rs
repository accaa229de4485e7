//! Error types for the GitHub client.

use chrono::{DateTime, Utc};

/// Which GitHub throttle produced a rate-limit response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitKind {
    /// Hourly quota exhausted (`x-ratelimit-remaining: 0`).
    Primary,

    /// Abuse detection / secondary limit.
    Secondary,
}

impl std::fmt::Display for RateLimitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primary => f.write_str("primary"),
            Self::Secondary => f.write_str("secondary"),
        }
    }
}

/// GitHub API errors.
#[derive(Debug, thiserror::Error)]
pub enum GithubError {
    /// Resource not found (or hidden from the current token).
    #[error("not found: {resource}")]
    NotFound { resource: String },

    /// Authentication failed or token lacks permission.
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    /// Rate limit hit; requests may resume at `reset_at`.
    #[error("{kind} rate limit exceeded, resets at {reset_at}")]
    RateLimited {
        kind: RateLimitKind,
        reset_at: DateTime<Utc>,
    },

    /// Network error or unexpected status.
    #[error("network error: {message}")]
    Network { message: String },

    /// Response body could not be decoded.
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// A download could not be written to its destination.
    #[error("write error: {0}")]
    Io(#[from] std::io::Error),
}

impl GithubError {
    /// Reset time when this is a primary or secondary rate-limit error.
    pub fn rate_limit_reset(&self) -> Option<(RateLimitKind, DateTime<Utc>)> {
        match self {
            Self::RateLimited { kind, reset_at } => Some((*kind, *reset_at)),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for GithubError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            message: err.to_string(),
        }
    }
}

/// Result type for GitHub operations.
pub type GithubResult<T> = Result<T, GithubError>;
