//! Error types for the analysis pipeline.

use std::path::{Path, PathBuf};

use trawl_github::{GithubError, WorkflowRun};

/// Run collection stopped early; the runs admitted before the failure are kept.
#[derive(Debug, thiserror::Error)]
#[error("run collection stopped after {} runs: {source}", .partial.len())]
pub struct PartialCollection {
    pub partial: Vec<WorkflowRun>,
    pub source: GithubError,
}

#[derive(Debug, thiserror::Error)]
pub enum TrawlError {
    #[error("configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Api(#[from] GithubError),

    #[error(transparent)]
    Collection(#[from] PartialCollection),

    /// Archive entry would land outside the extraction directory.
    #[error("illegal file path in archive: {entry}")]
    PathTraversal { entry: String },

    #[error("invalid archive {}: {source}", .path.display())]
    Archive {
        path: PathBuf,
        source: zip::result::ZipError,
    },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse report {}: {message}", .path.display())]
    ReportParse { path: PathBuf, message: String },

    #[error("run {run_id} failed: {source}")]
    Run {
        run_id: u64,
        source: Box<TrawlError>,
    },

    #[error("worker task failed: {message}")]
    Task { message: String },
}

impl TrawlError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Wrap an error with the run it belongs to.
    pub fn for_run(self, run_id: u64) -> Self {
        Self::Run {
            run_id,
            source: Box::new(self),
        }
    }
}

/// `map_err` adapter attaching the path to an I/O error.
pub(crate) fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> TrawlError + '_ {
    move |source| TrawlError::Io {
        path: path.to_path_buf(),
        source,
    }
}

pub type TrawlResult<T> = Result<T, TrawlError>;
