//! GitHub Actions client.
//!
//! Public API: no status code knowledge. All HTTP/status mapping in http.rs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tokio::io::AsyncWrite;
use tracing::debug;

use crate::api::{ActionsApi, RUNS_PER_PAGE};
use crate::auth::TokenProvider;
use crate::error::{GithubError, GithubResult};
use crate::types::{
    Artifact, ArtifactList, GithubConfig, Page, RepoSlug, Workflow, WorkflowList, WorkflowRun,
    WorkflowRunList,
};

mod helpers;
mod http;

use http::HttpBackend;

/// REST client for the Actions endpoints the analyzer uses.
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: HttpBackend,
}

impl GithubClient {
    pub fn new(config: GithubConfig) -> GithubResult<Self> {
        let token_provider = config
            .token
            .as_ref()
            .map(TokenProvider::static_token)
            .unwrap_or_else(TokenProvider::from_env);

        Self::with_token_provider(config, token_provider)
    }

    pub fn with_token_provider(
        config: GithubConfig,
        token_provider: TokenProvider,
    ) -> GithubResult<Self> {
        let user_agent =
            HeaderValue::from_str(&config.user_agent).map_err(|e| GithubError::Config {
                message: format!("invalid user agent {:?}: {}", config.user_agent, e),
            })?;
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, user_agent);

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.timeout_secs))
            .read_timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(default_headers)
            .build()
            .map_err(|e| GithubError::Network {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        let base_url = config.url.trim_end_matches('/').to_string();

        Ok(Self {
            http: HttpBackend {
                client,
                base_url,
                token_provider,
            },
        })
    }

    pub fn from_env() -> GithubResult<Self> {
        Self::new(GithubConfig::from_env())
    }

    pub fn base_url(&self) -> &str {
        &self.http.base_url
    }

    pub fn is_authenticated(&self) -> bool {
        self.http.token_provider.is_authenticated()
    }

    fn repo_path(repo: &RepoSlug) -> String {
        format!("/repos/{}/{}/actions", repo.owner, repo.name)
    }
}

#[async_trait]
impl ActionsApi for GithubClient {
    async fn list_workflows(&self, repo: &RepoSlug) -> GithubResult<Vec<Workflow>> {
        let path = format!("{}/workflows", Self::repo_path(repo));
        debug!(repo = %repo, "listing workflows");

        let page = self
            .http
            .get_json::<WorkflowList>(&path, &[("per_page", "100".to_string())])
            .await?;
        if page.body.total_count > page.body.workflows.len() as u64 {
            debug!(
                total = page.body.total_count,
                returned = page.body.workflows.len(),
                "workflow listing truncated to first page"
            );
        }
        Ok(page.body.workflows)
    }

    async fn list_runs(
        &self,
        repo: &RepoSlug,
        workflow_id: u64,
        branch: &str,
        page: u32,
    ) -> GithubResult<Page<WorkflowRun>> {
        let path = format!("{}/workflows/{}/runs", Self::repo_path(repo), workflow_id);
        debug!(repo = %repo, workflow_id, branch, page, "listing workflow runs");

        let response = self
            .http
            .get_json::<WorkflowRunList>(
                &path,
                &[
                    ("branch", branch.to_string()),
                    ("page", page.to_string()),
                    ("per_page", RUNS_PER_PAGE.to_string()),
                ],
            )
            .await?;

        Ok(Page {
            items: response.body.workflow_runs,
            next_page: response.next_page,
        })
    }

    async fn list_artifacts(&self, repo: &RepoSlug, run_id: u64) -> GithubResult<Vec<Artifact>> {
        let path = format!("{}/runs/{}/artifacts", Self::repo_path(repo), run_id);
        debug!(repo = %repo, run_id, "listing run artifacts");

        let response = self.http.get_json::<ArtifactList>(&path, &[]).await?;
        Ok(response.body.artifacts)
    }

    async fn download_artifact(
        &self,
        repo: &RepoSlug,
        artifact_id: u64,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> GithubResult<u64> {
        let path = format!("{}/artifacts/{}/zip", Self::repo_path(repo), artifact_id);
        debug!(repo = %repo, artifact_id, "downloading artifact");

        self.http.download_to(&path, sink).await
    }
}
