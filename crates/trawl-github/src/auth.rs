//! Token authentication for the GitHub API.
//!
//! Unauthenticated requests work for public repositories but are limited to
//! 60 requests per hour and cannot download artifacts, so a token is
//! effectively required for real analyses.

/// Token provider for API authentication.
#[derive(Debug, Clone, Default)]
pub enum TokenProvider {
    /// Static token (from config, flag or env).
    Static(String),

    /// No authentication.
    #[default]
    None,
}

impl TokenProvider {
    /// Create a static token provider.
    pub fn static_token(token: impl Into<String>) -> Self {
        Self::Static(token.into())
    }

    /// Create from environment variables.
    ///
    /// Checks `GITHUB_TOKEN`, then `GH_TOKEN`; empty values are ignored.
    pub fn from_env() -> Self {
        for var in ["GITHUB_TOKEN", "GH_TOKEN"] {
            if let Ok(token) = std::env::var(var) {
                if !token.is_empty() {
                    return Self::Static(token);
                }
            }
        }

        Self::None
    }

    /// The token to send, if any.
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Static(token) => Some(token),
            Self::None => None,
        }
    }

    /// Check if authentication is configured.
    pub fn is_authenticated(&self) -> bool {
        !matches!(self, Self::None)
    }
}
