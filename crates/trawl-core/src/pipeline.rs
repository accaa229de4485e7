//! Workflow analysis: collect runs, then retrieve, extract and parse each
//! run's reports on a bounded worker pool before aggregating.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use trawl_github::{ActionsApi, RepoSlug, Workflow, WorkflowRun};

use crate::aggregate::{Aggregator, BatchSummary, FailureTableEntry, RunReport};
use crate::collector::RunCollector;
use crate::config::{AnalyzerConfig, FailurePolicy};
use crate::error::{io_error, TrawlError, TrawlResult};
use crate::extract::extract_archive;
use crate::junit::parse_report_dir;
use crate::retriever::{ArtifactRetriever, Retrieved};
use crate::throttle::RateLimitGate;

/// Name of the extracted report tree inside a run's directory.
pub const REPORT_DIR_NAME: &str = "report";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    Reported(RunReport),
    NoArtifact,
    Expired { artifact: String },
    /// Processing failed and the failure was isolated to this run.
    Errored { message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyzedRun {
    pub run: WorkflowRun,
    pub outcome: RunOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkflowAnalysis {
    pub workflow: Workflow,
    /// In collection order (newest first).
    pub runs: Vec<AnalyzedRun>,
    pub summary: BatchSummary,
    pub failures: Vec<FailureTableEntry>,
    /// Set when run collection stopped early and only a partial set was analyzed.
    pub collection_error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub repo: RepoSlug,
    pub branch: String,
    pub workflows: Vec<WorkflowAnalysis>,
    /// Work root left on disk, if any.
    pub work_dir: Option<PathBuf>,
}

/// Per-run working directories live under this root.
enum WorkRoot {
    Temp(tempfile::TempDir),
    Fixed(PathBuf),
}

impl WorkRoot {
    fn path(&self) -> &Path {
        match self {
            Self::Temp(dir) => dir.path(),
            Self::Fixed(path) => path,
        }
    }
}

pub struct Analyzer {
    api: Arc<dyn ActionsApi>,
    gate: Arc<RateLimitGate>,
    config: AnalyzerConfig,
}

impl Analyzer {
    pub fn new(api: Arc<dyn ActionsApi>, config: AnalyzerConfig) -> Self {
        Self {
            api,
            gate: Arc::new(RateLimitGate::new()),
            config,
        }
    }

    /// Analyze every matching workflow of the configured repository.
    pub async fn analyze(&self) -> TrawlResult<Analysis> {
        self.config.validate()?;
        let repo = &self.config.repo;

        let workflows = self
            .gate
            .call("list workflows", || self.api.list_workflows(repo))
            .await?;

        let workflows: Vec<Workflow> = match &self.config.workflow_filter {
            Some(name) => {
                let matched: Vec<Workflow> =
                    workflows.into_iter().filter(|w| &w.name == name).collect();
                if matched.is_empty() {
                    return Err(TrawlError::config(format!(
                        "no workflow named {name:?} in {repo}"
                    )));
                }
                matched
            }
            None => workflows,
        };
        info!(repo = %repo, workflows = workflows.len(), "found workflows");

        let root = self.work_root()?;
        let mut analyses = Vec::with_capacity(workflows.len());
        for workflow in workflows {
            analyses.push(self.analyze_workflow(workflow, root.path()).await?);
        }

        let work_dir = match &root {
            WorkRoot::Fixed(path) => Some(path.clone()),
            WorkRoot::Temp(dir) if self.config.keep_work_dir => Some(dir.path().to_path_buf()),
            WorkRoot::Temp(_) => None,
        };

        Ok(Analysis {
            repo: repo.clone(),
            branch: self.config.branch.clone(),
            workflows: analyses,
            work_dir,
        })
    }

    /// Collect, process and aggregate the runs of one workflow. Each run
    /// gets `<work_dir>/<run-id>/`.
    pub async fn analyze_workflow(
        &self,
        workflow: Workflow,
        work_dir: &Path,
    ) -> TrawlResult<WorkflowAnalysis> {
        info!(workflow = %workflow.name, workflow_id = workflow.id, "analyzing workflow");

        let collector = RunCollector::new(
            self.api.as_ref(),
            &self.gate,
            &self.config.repo,
            self.config.window,
        );
        let (runs, collection_error) =
            match collector.collect(workflow.id, &self.config.branch).await {
                Ok(runs) => (runs, None),
                Err(partial) if self.config.failure_policy == FailurePolicy::Isolate => {
                    warn!(
                        workflow = %workflow.name,
                        collected = partial.partial.len(),
                        error = %partial.source,
                        "run collection incomplete, analyzing partial set"
                    );
                    let message = partial.source.to_string();
                    (partial.partial, Some(message))
                }
                Err(partial) => return Err(partial.into()),
            };
        info!(workflow = %workflow.name, runs = runs.len(), "collected runs");

        let outcomes = self.process_runs(&runs, work_dir).await?;

        let mut aggregator = Aggregator::new();
        for outcome in &outcomes {
            match outcome {
                RunOutcome::Reported(report) => aggregator.add_report(report),
                RunOutcome::NoArtifact | RunOutcome::Expired { .. } => aggregator.add_skipped(),
                RunOutcome::Errored { .. } => aggregator.add_errored(),
            }
        }
        let (summary, failures) = aggregator.finish();

        let runs = runs
            .into_iter()
            .zip(outcomes)
            .map(|(run, outcome)| AnalyzedRun { run, outcome })
            .collect();

        Ok(WorkflowAnalysis {
            workflow,
            runs,
            summary,
            failures,
            collection_error,
        })
    }

    /// Outcomes in the same order as `runs`, regardless of completion order.
    async fn process_runs(
        &self,
        runs: &[WorkflowRun],
        work_dir: &Path,
    ) -> TrawlResult<Vec<RunOutcome>> {
        let sem = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let mut join_set = JoinSet::new();

        for (index, run) in runs.iter().enumerate() {
            let sem = sem.clone();
            let api = self.api.clone();
            let gate = self.gate.clone();
            let repo = self.config.repo.clone();
            let run_id = run.id;
            let run_dir = work_dir.join(run_id.to_string());

            join_set.spawn(async move {
                let result = match sem.acquire_owned().await {
                    Ok(_permit) => process_run(api.as_ref(), &gate, &repo, run_id, &run_dir).await,
                    Err(e) => Err(TrawlError::Task {
                        message: e.to_string(),
                    }),
                };
                (index, run_id, result)
            });
        }

        let mut outcomes: Vec<Option<RunOutcome>> = vec![None; runs.len()];
        while let Some(joined) = join_set.join_next().await {
            let (index, run_id, result) = match joined {
                Ok(done) => done,
                Err(e) if self.config.failure_policy == FailurePolicy::Isolate => {
                    warn!(error = %e, "run worker task failed");
                    continue;
                }
                Err(e) => {
                    return Err(TrawlError::Task {
                        message: e.to_string(),
                    })
                }
            };

            let outcome = match result {
                Ok(outcome) => outcome,
                Err(err) if self.config.failure_policy == FailurePolicy::Isolate => {
                    warn!(run_id, error = %err, "run processing failed, continuing");
                    RunOutcome::Errored {
                        message: err.to_string(),
                    }
                }
                // Dropping the join set aborts the remaining runs.
                Err(err) => return Err(err.for_run(run_id)),
            };
            outcomes[index] = Some(outcome);
        }

        Ok(outcomes
            .into_iter()
            .map(|outcome| {
                outcome.unwrap_or_else(|| RunOutcome::Errored {
                    message: "worker task failed".into(),
                })
            })
            .collect())
    }

    fn work_root(&self) -> TrawlResult<WorkRoot> {
        if let Some(dir) = &self.config.work_dir {
            std::fs::create_dir_all(dir).map_err(io_error(dir))?;
            return Ok(WorkRoot::Fixed(dir.clone()));
        }

        let dir = tempfile::Builder::new()
            .prefix("trawl-")
            .keep(self.config.keep_work_dir)
            .tempdir()
            .map_err(io_error(&std::env::temp_dir()))?;
        debug!(path = %dir.path().display(), "created work root");
        Ok(WorkRoot::Temp(dir))
    }
}

/// Retrieve, extract and parse one run inside `run_dir`.
async fn process_run(
    api: &dyn ActionsApi,
    gate: &RateLimitGate,
    repo: &RepoSlug,
    run_id: u64,
    run_dir: &Path,
) -> TrawlResult<RunOutcome> {
    let archive = match ArtifactRetriever::new(api, gate, repo)
        .retrieve(run_id, run_dir)
        .await?
    {
        Retrieved::Archive(path) => path,
        Retrieved::NoArtifact => return Ok(RunOutcome::NoArtifact),
        Retrieved::Expired { name } => return Ok(RunOutcome::Expired { artifact: name }),
    };

    let report_dir = run_dir.join(REPORT_DIR_NAME);
    let suites = tokio::task::spawn_blocking(move || {
        extract_archive(&archive, &report_dir)?;
        parse_report_dir(&report_dir)
    })
    .await
    .map_err(|e| TrawlError::Task {
        message: e.to_string(),
    })??;

    let report = RunReport::new(run_id, suites);
    debug!(
        run_id,
        tests = report.totals.tests,
        failed = report.totals.failed,
        errored = report.totals.errored,
        "parsed run report"
    );
    Ok(RunOutcome::Reported(report))
}
