//! GitHub Actions client for workflow-run analysis.
//!
//! This crate provides:
//!
//! - The [`ActionsApi`] capability trait (list workflows, list runs, list
//!   artifacts, download an artifact)
//! - [`GithubClient`], its REST implementation with token auth
//! - Typed primary/secondary rate-limit errors carrying the reset time
//!
//! # Quick Start
//!
//! ```no_run
//! use trawl_github::{ActionsApi, GithubClient, GithubConfig, RepoSlug};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GithubClient::new(GithubConfig::from_env())?;
//! let repo = RepoSlug::parse("etcd-io/etcd")?;
//!
//! for workflow in client.list_workflows(&repo).await? {
//!     println!("{} {}", workflow.id, workflow.name);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `TRAWL_GITHUB_API_URL` | REST API base URL (default: `https://api.github.com`) |
//! | `GITHUB_TOKEN` / `GH_TOKEN` | Authentication token |
//! | `TRAWL_GITHUB_TIMEOUT` | Request timeout in seconds (default: 120) |

pub mod api;
pub mod auth;
pub mod client;
pub mod error;
pub mod types;

pub use api::{ActionsApi, RUNS_PER_PAGE};
pub use auth::TokenProvider;
pub use client::GithubClient;
pub use error::{GithubError, GithubResult, RateLimitKind};
pub use types::{
    Artifact, ArtifactList, GithubConfig, Page, RepoSlug, Workflow, WorkflowList, WorkflowRun,
    WorkflowRunList,
};
