//! Workflow-run test-failure analysis.
//!
//! The [`Analyzer`] walks a repository's workflows and, for each one:
//!
//! 1. collects recent runs with [`RunCollector`] inside a [`RunCollectionWindow`],
//! 2. downloads each run's test artifact with [`ArtifactRetriever`],
//! 3. expands it with [`extract_archive`] and parses the JUnit reports,
//! 4. aggregates a [`BatchSummary`] and a ranked failure table.
//!
//! All API calls share one [`RateLimitGate`], so a rate limit seen by any
//! worker suspends every worker until the reported reset.

pub mod aggregate;
pub mod collector;
pub mod config;
pub mod error;
pub mod extract;
pub mod junit;
pub mod pipeline;
pub mod retriever;
pub mod throttle;

#[cfg(test)]
mod testing;

pub use aggregate::{Aggregator, BatchSummary, FailureTable, FailureTableEntry, RunReport};
pub use collector::{RunCollectionWindow, RunCollector};
pub use config::{AnalyzerConfig, FailurePolicy, DEFAULT_CONCURRENCY};
pub use error::{PartialCollection, TrawlError, TrawlResult};
pub use extract::{extract_archive, ExtractSummary};
pub use junit::{parse_report, parse_report_dir, TestCaseResult, TestStatus, TestSuiteResult, Totals};
pub use pipeline::{AnalyzedRun, Analysis, Analyzer, RunOutcome, WorkflowAnalysis};
pub use retriever::{ArtifactRetriever, Retrieved, ARCHIVE_FILE_NAME};
pub use throttle::RateLimitGate;
