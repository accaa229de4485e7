use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use trawl_core::{AnalyzerConfig, FailurePolicy, DEFAULT_CONCURRENCY};
use trawl_github::RepoSlug;

#[derive(Parser, Debug)]
#[command(
    name = "trawl",
    about = "Rank the tests that fail most often across recent GitHub Actions runs"
)]
pub struct Cli {
    /// Disable colored log output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Color log output even when stderr is not a terminal
    #[arg(long, global = true, conflicts_with = "no_color")]
    pub force_color: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze test failures from a target repository
    Run(RunArgs),
    /// Print the version and build revision
    Version,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(clap::Args, Debug, Clone)]
#[command(after_help = "Examples:\n\
  # Failures in the last week of runs on main\n\
  trawl run --repo etcd-io/etcd --branch main --max-age 7d\n\
\n\
  # At most 50 runs of one workflow, as JSON\n\
  trawl run --max-age 30d --max-runs 50 --workflow Tests --format json\n")]
pub struct RunArgs {
    /// Target repository as owner/name
    #[arg(long, default_value = "etcd-io/etcd")]
    pub repo: RepoSlug,

    /// Branch whose runs are analyzed
    #[arg(long, default_value = "main")]
    pub branch: String,

    /// Only runs created within this period (e.g. "36h", "7d"); "0s" means no limit
    #[arg(long)]
    pub max_age: humantime::Duration,

    /// Maximum number of runs per workflow (0 = no limit)
    #[arg(long, default_value_t = 0)]
    pub max_runs: usize,

    /// Only analyze the workflow with this exact name
    #[arg(long)]
    pub workflow: Option<String>,

    /// Number of runs processed concurrently
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Abort a workflow's batch on the first run error instead of skipping the run
    #[arg(long)]
    pub fail_fast: bool,

    /// Directory for downloaded artifacts (kept after the run). Defaults to a temporary directory.
    #[arg(long)]
    pub work_dir: Option<PathBuf>,

    /// Keep the temporary work directory
    #[arg(long)]
    pub keep_work_dir: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Show only the N most frequent failures
    #[arg(long)]
    pub top: Option<usize>,

    /// GitHub token used to authenticate API requests
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// GitHub REST API base URL
    #[arg(long, env = "TRAWL_GITHUB_API_URL")]
    pub api_url: Option<String>,
}

impl RunArgs {
    pub fn analyzer_config(&self) -> AnalyzerConfig {
        let policy = if self.fail_fast {
            FailurePolicy::FailFast
        } else {
            FailurePolicy::Isolate
        };

        let mut config = AnalyzerConfig::new(self.repo.clone(), self.branch.clone())
            .with_window(*self.max_age, self.max_runs)
            .with_concurrency(self.concurrency)
            .with_failure_policy(policy)
            .with_keep_work_dir(self.keep_work_dir);

        if let Some(name) = &self.workflow {
            config = config.with_workflow_filter(name.clone());
        }
        if let Some(dir) = &self.work_dir {
            config = config.with_work_dir(dir.clone());
        }
        config
    }
}
