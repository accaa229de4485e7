//! Analyzer settings.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use trawl_github::RepoSlug;

use crate::collector::RunCollectionWindow;
use crate::error::{TrawlError, TrawlResult};

/// Default number of runs processed concurrently.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// What a failing run does to the rest of its batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Record the run as errored and keep going.
    #[default]
    Isolate,
    /// Abort the workflow's batch on the first run error.
    FailFast,
}

#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub repo: RepoSlug,
    pub branch: String,
    pub window: RunCollectionWindow,
    /// Only analyze the workflow with exactly this name.
    pub workflow_filter: Option<String>,
    pub concurrency: usize,
    pub failure_policy: FailurePolicy,
    /// Explicit work root; a temporary directory is used when unset.
    pub work_dir: Option<PathBuf>,
    /// Keep the temporary work root after the analysis finishes.
    pub keep_work_dir: bool,
}

impl AnalyzerConfig {
    pub fn new(repo: RepoSlug, branch: impl Into<String>) -> Self {
        Self {
            repo,
            branch: branch.into(),
            window: RunCollectionWindow::unbounded(),
            workflow_filter: None,
            concurrency: DEFAULT_CONCURRENCY,
            failure_policy: FailurePolicy::default(),
            work_dir: None,
            keep_work_dir: false,
        }
    }

    pub fn with_window(mut self, max_age: Duration, max_count: usize) -> Self {
        self.window = RunCollectionWindow::new(max_age, max_count);
        self
    }

    pub fn with_workflow_filter(mut self, name: impl Into<String>) -> Self {
        self.workflow_filter = Some(name.into());
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    pub fn with_keep_work_dir(mut self, keep: bool) -> Self {
        self.keep_work_dir = keep;
        self
    }

    pub fn validate(&self) -> TrawlResult<()> {
        if self.branch.trim().is_empty() {
            return Err(TrawlError::config("branch must not be empty"));
        }
        if self.concurrency == 0 {
            return Err(TrawlError::config("concurrency must be at least 1"));
        }
        if matches!(&self.workflow_filter, Some(name) if name.trim().is_empty()) {
            return Err(TrawlError::config("workflow name filter must not be empty"));
        }
        Ok(())
    }
}
