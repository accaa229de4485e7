//! API response types for the GitHub Actions endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A workflow definition (`.github/workflows/*.yml`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: u64,

    pub name: String,

    /// Path of the workflow file in the repository.
    #[serde(default)]
    pub path: String,

    /// `active`, `disabled_manually`, ...
    #[serde(default)]
    pub state: String,
}

/// One execution of a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowRun {
    pub id: u64,

    pub workflow_id: u64,

    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub head_branch: Option<String>,

    /// `queued`, `in_progress`, `completed`.
    #[serde(default)]
    pub status: Option<String>,

    /// `success`, `failure`, `cancelled`, ... (None while running).
    #[serde(default)]
    pub conclusion: Option<String>,
}

/// An artifact uploaded by a workflow run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: u64,

    pub name: String,

    #[serde(default)]
    pub size_in_bytes: u64,

    /// Expired artifacts are listed but can no longer be downloaded.
    #[serde(default)]
    pub expired: bool,
}

/// Response from `GET /repos/{owner}/{repo}/actions/workflows`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowList {
    pub total_count: u64,
    pub workflows: Vec<Workflow>,
}

/// Response from `GET .../actions/workflows/{id}/runs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRunList {
    pub total_count: u64,
    pub workflow_runs: Vec<WorkflowRun>,
}

/// Response from `GET .../actions/runs/{id}/artifacts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactList {
    pub total_count: u64,
    pub artifacts: Vec<Artifact>,
}

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,

    /// Page number of the next page, from the `Link: rel="next"` header.
    pub next_page: Option<u32>,
}

impl<T> Page<T> {
    /// A page with no successor.
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_page: None,
        }
    }
}

/// `owner/name` pair identifying a repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoSlug {
    pub owner: String,
    pub name: String,
}

impl RepoSlug {
    /// Parse an `owner/name` slug. Exactly two non-empty segments are accepted.
    pub fn parse(slug: &str) -> Result<Self, String> {
        let segments: Vec<&str> = slug.split('/').collect();
        match segments.as_slice() {
            [owner, name] if !owner.is_empty() && !name.is_empty() => Ok(Self {
                owner: (*owner).to_string(),
                name: (*name).to_string(),
            }),
            [_, _] => Err(format!(
                "invalid repo slug {slug:?}: owner and name must be non-empty"
            )),
            _ => Err(format!(
                "invalid repo slug {slug:?}: expected form owner/repo, but {} segments were found",
                segments.len()
            )),
        }
    }
}

impl std::fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl std::str::FromStr for RepoSlug {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// Base URL for the REST API.
    #[serde(default = "default_api_url")]
    pub url: String,

    /// Authentication token.
    #[serde(default)]
    pub token: Option<String>,

    /// Connect and per-read timeout in seconds. A streamed download has no
    /// overall deadline, so large artifacts are not cut off.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Value of the `User-Agent` header (GitHub rejects requests without one).
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_timeout() -> u64 {
    120
}

fn default_user_agent() -> String {
    concat!("trawl/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            url: default_api_url(),
            token: None,
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl GithubConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `TRAWL_GITHUB_API_URL` | REST API base URL |
    /// | `GITHUB_TOKEN` | Authentication token |
    /// | `TRAWL_GITHUB_TIMEOUT` | Connect and read timeout in seconds |
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("TRAWL_GITHUB_API_URL").unwrap_or_else(|_| default_api_url()),
            token: std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty()),
            timeout_secs: std::env::var("TRAWL_GITHUB_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_timeout),
            user_agent: default_user_agent(),
        }
    }

    /// Set the token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the base URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}
