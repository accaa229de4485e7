//! Per-run report totals and the cross-run failure table.

use std::collections::HashMap;

use serde::Serialize;

use crate::junit::{TestCaseResult, TestSuiteResult, Totals};

/// Parsed reports of one workflow run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub run_id: u64,
    pub suites: Vec<TestSuiteResult>,
    pub totals: Totals,
}

impl RunReport {
    pub fn new(run_id: u64, suites: Vec<TestSuiteResult>) -> Self {
        let mut totals = Totals::default();
        for suite in &suites {
            totals.merge(&suite.totals);
        }
        Self {
            run_id,
            suites,
            totals,
        }
    }

    /// A run fails when any of its tests failed or errored.
    pub fn failed(&self) -> bool {
        self.totals.is_failed()
    }

    pub fn failed_cases(&self) -> impl Iterator<Item = &TestCaseResult> {
        self.suites
            .iter()
            .flat_map(|suite| suite.cases.iter())
            .filter(|case| case.status.is_failure())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureTableEntry {
    pub test_name: String,
    pub test_package: String,
    pub failure_count: u64,
}

/// Failure counts keyed by (package, name).
#[derive(Debug, Default)]
pub struct FailureTable {
    counts: HashMap<(String, String), u64>,
}

impl FailureTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count every failed or errored case of `report`. A test that fails in
    /// several suites of the same run is counted once per occurrence.
    pub fn record_run(&mut self, report: &RunReport) {
        for case in report.failed_cases() {
            *self
                .counts
                .entry((case.classname.clone(), case.name.clone()))
                .or_insert(0) += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Entries by failure count descending, then package, then name.
    pub fn into_ranked(self) -> Vec<FailureTableEntry> {
        let mut entries: Vec<FailureTableEntry> = self
            .counts
            .into_iter()
            .map(|((test_package, test_name), failure_count)| FailureTableEntry {
                test_name,
                test_package,
                failure_count,
            })
            .collect();

        entries.sort_by(|a, b| {
            b.failure_count
                .cmp(&a.failure_count)
                .then_with(|| a.test_package.cmp(&b.test_package))
                .then_with(|| a.test_name.cmp(&b.test_name))
        });
        entries
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    /// Runs that produced a report (passed + failed).
    pub total_runs: usize,
    pub passed_runs: usize,
    pub failed_runs: usize,
    /// Runs without a usable artifact.
    pub skipped_runs: usize,
    /// Runs whose processing failed and was isolated.
    pub errored_runs: usize,
    pub pass_fraction: f64,
}

/// Single-writer accumulator for one workflow's batch of runs.
#[derive(Debug, Default)]
pub struct Aggregator {
    summary: BatchSummary,
    failures: FailureTable,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_report(&mut self, report: &RunReport) {
        self.summary.total_runs += 1;
        if report.failed() {
            self.summary.failed_runs += 1;
        } else {
            self.summary.passed_runs += 1;
        }
        self.failures.record_run(report);
    }

    pub fn add_skipped(&mut self) {
        self.summary.skipped_runs += 1;
    }

    pub fn add_errored(&mut self) {
        self.summary.errored_runs += 1;
    }

    pub fn finish(self) -> (BatchSummary, Vec<FailureTableEntry>) {
        let mut summary = self.summary;
        summary.pass_fraction = if summary.total_runs == 0 {
            0.0
        } else {
            summary.passed_runs as f64 / summary.total_runs as f64
        };
        (summary, self.failures.into_ranked())
    }
}
