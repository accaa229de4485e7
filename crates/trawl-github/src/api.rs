//! Capability interface over the GitHub Actions API.
//!
//! The analyzer only needs four calls. Keeping them behind a trait lets the
//! collector and retriever run against canned pages and simulated rate limits.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncWrite;

use crate::error::GithubResult;
use crate::types::{Artifact, Page, RepoSlug, Workflow, WorkflowRun};

/// Runs requested per page. 100 is the API maximum.
pub const RUNS_PER_PAGE: u32 = 100;

#[async_trait]
pub trait ActionsApi: Send + Sync {
    /// List the repository's workflows (first 100 only).
    async fn list_workflows(&self, repo: &RepoSlug) -> GithubResult<Vec<Workflow>>;

    /// List one page of a workflow's runs on `branch`, newest first.
    async fn list_runs(
        &self,
        repo: &RepoSlug,
        workflow_id: u64,
        branch: &str,
        page: u32,
    ) -> GithubResult<Page<WorkflowRun>>;

    /// List the artifacts of a run in upload order.
    async fn list_artifacts(&self, repo: &RepoSlug, run_id: u64) -> GithubResult<Vec<Artifact>>;

    /// Stream an artifact's zip archive into `sink`; returns the bytes written.
    async fn download_artifact(
        &self,
        repo: &RepoSlug,
        artifact_id: u64,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> GithubResult<u64>;
}

#[async_trait]
impl<T: ActionsApi + ?Sized> ActionsApi for Arc<T> {
    async fn list_workflows(&self, repo: &RepoSlug) -> GithubResult<Vec<Workflow>> {
        (**self).list_workflows(repo).await
    }

    async fn list_runs(
        &self,
        repo: &RepoSlug,
        workflow_id: u64,
        branch: &str,
        page: u32,
    ) -> GithubResult<Page<WorkflowRun>> {
        (**self).list_runs(repo, workflow_id, branch, page).await
    }

    async fn list_artifacts(&self, repo: &RepoSlug, run_id: u64) -> GithubResult<Vec<Artifact>> {
        (**self).list_artifacts(repo, run_id).await
    }

    async fn download_artifact(
        &self,
        repo: &RepoSlug,
        artifact_id: u64,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> GithubResult<u64> {
        (**self).download_artifact(repo, artifact_id, sink).await
    }
}
