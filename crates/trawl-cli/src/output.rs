//! Rendering of analysis results.

use std::fmt::Write as _;

use serde::Serialize;
use trawl_core::{Analysis, BatchSummary, FailureTableEntry, WorkflowAnalysis};

fn top_failures(failures: &[FailureTableEntry], top: Option<usize>) -> &[FailureTableEntry] {
    match top {
        Some(n) if n < failures.len() => &failures[..n],
        _ => failures,
    }
}

/// Plain-text report: one block per workflow with its ranked failure table.
pub fn render_text(analysis: &Analysis, top: Option<usize>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Repository: {} (branch {})", analysis.repo, analysis.branch);

    if analysis.workflows.is_empty() {
        let _ = writeln!(out, "\nNo workflows found.");
    }
    for workflow in &analysis.workflows {
        out.push('\n');
        render_workflow(&mut out, workflow, top);
    }
    out
}

fn render_workflow(out: &mut String, workflow: &WorkflowAnalysis, top: Option<usize>) {
    let s = &workflow.summary;
    let _ = writeln!(out, "Workflow: {} ({})", workflow.workflow.name, workflow.workflow.path);
    let _ = writeln!(
        out,
        "Runs: {} analyzed, {} passed, {} failed, {} skipped, {} errored (pass rate {:.1}%)",
        s.total_runs,
        s.passed_runs,
        s.failed_runs,
        s.skipped_runs,
        s.errored_runs,
        s.pass_fraction * 100.0
    );
    if let Some(err) = &workflow.collection_error {
        let _ = writeln!(out, "Warning: run collection incomplete: {err}");
    }

    let failures = top_failures(&workflow.failures, top);
    if failures.is_empty() {
        let _ = writeln!(out, "No test failures.");
        return;
    }

    let count_width = failures
        .iter()
        .map(|f| f.failure_count.to_string().len())
        .max()
        .unwrap_or(0)
        .max("FAILURES".len());
    let package_width = failures
        .iter()
        .map(|f| f.test_package.len())
        .max()
        .unwrap_or(0)
        .max("PACKAGE".len());

    let _ = writeln!(
        out,
        "{:>count_width$}  {:<package_width$}  TEST",
        "FAILURES", "PACKAGE"
    );
    for f in failures {
        let _ = writeln!(
            out,
            "{:>count_width$}  {:<package_width$}  {}",
            f.failure_count, f.test_package, f.test_name
        );
    }
    if failures.len() < workflow.failures.len() {
        let _ = writeln!(
            out,
            "... {} more failing tests",
            workflow.failures.len() - failures.len()
        );
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    repo: String,
    branch: &'a str,
    work_dir: Option<String>,
    workflows: Vec<JsonWorkflow<'a>>,
}

#[derive(Serialize)]
struct JsonWorkflow<'a> {
    id: u64,
    name: &'a str,
    path: &'a str,
    summary: &'a BatchSummary,
    collection_error: Option<&'a str>,
    failures: &'a [FailureTableEntry],
}

pub fn render_json(analysis: &Analysis, top: Option<usize>) -> serde_json::Result<String> {
    let report = JsonReport {
        repo: analysis.repo.to_string(),
        branch: &analysis.branch,
        work_dir: analysis.work_dir.as_ref().map(|p| p.display().to_string()),
        workflows: analysis
            .workflows
            .iter()
            .map(|w| JsonWorkflow {
                id: w.workflow.id,
                name: &w.workflow.name,
                path: &w.workflow.path,
                summary: &w.summary,
                collection_error: w.collection_error.as_deref(),
                failures: top_failures(&w.failures, top),
            })
            .collect(),
    };
    serde_json::to_string_pretty(&report)
}
