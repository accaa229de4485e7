//! Per-run artifact download.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use trawl_github::{ActionsApi, GithubError, RepoSlug};

use crate::error::{io_error, TrawlError, TrawlResult};
use crate::throttle::RateLimitGate;

/// File name of the downloaded archive inside a run's directory.
pub const ARCHIVE_FILE_NAME: &str = "artifact.zip";

/// What the retriever found for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Retrieved {
    /// Archive written to this path.
    Archive(PathBuf),

    /// The run uploaded nothing (e.g. the build failed before tests ran).
    NoArtifact,

    /// The artifact exists but is past its retention period.
    Expired { name: String },
}

pub struct ArtifactRetriever<'a> {
    api: &'a dyn ActionsApi,
    gate: &'a RateLimitGate,
    repo: &'a RepoSlug,
}

impl<'a> ArtifactRetriever<'a> {
    pub fn new(api: &'a dyn ActionsApi, gate: &'a RateLimitGate, repo: &'a RepoSlug) -> Self {
        Self { api, gate, repo }
    }

    /// Download the first artifact of `run_id` into `dir/artifact.zip`.
    ///
    /// Runs are expected to upload a single artifact; extra ones are ignored
    /// with a warning. The archive is streamed to disk, and each attempt after
    /// a rate limit starts over with a truncated file. Download and write
    /// failures are returned.
    pub async fn retrieve(&self, run_id: u64, dir: &Path) -> TrawlResult<Retrieved> {
        let artifacts = self
            .gate
            .call("list run artifacts", || self.api.list_artifacts(self.repo, run_id))
            .await?;

        let Some(artifact) = artifacts.first() else {
            warn!(run_id, "no artifacts found for run, skipping");
            return Ok(Retrieved::NoArtifact);
        };

        if artifacts.len() > 1 {
            warn!(
                run_id,
                count = artifacts.len(),
                using = %artifact.name,
                "expected a single artifact per run, only using the first"
            );
        }

        if artifact.expired {
            warn!(run_id, artifact = %artifact.name, "artifact expired, skipping");
            return Ok(Retrieved::Expired {
                name: artifact.name.clone(),
            });
        }

        info!(
            run_id,
            artifact_id = artifact.id,
            artifact = %artifact.name,
            "downloading artifact"
        );
        tokio::fs::create_dir_all(dir).await.map_err(io_error(dir))?;
        let path = dir.join(ARCHIVE_FILE_NAME);

        let (api, repo, artifact_id, target) = (self.api, self.repo, artifact.id, path.as_path());
        let written = self
            .gate
            .call("download artifact", move || async move {
                let mut file = tokio::fs::File::create(target).await?;
                let written = api.download_artifact(repo, artifact_id, &mut file).await?;
                file.flush().await?;
                Ok::<_, GithubError>(written)
            })
            .await
            .map_err(|err| match err {
                GithubError::Io(source) => TrawlError::Io {
                    path: path.clone(),
                    source,
                },
                other => other.into(),
            })?;
        debug!(run_id, artifact_id, bytes = written, "artifact written");

        Ok(Retrieved::Archive(path))
    }
}
