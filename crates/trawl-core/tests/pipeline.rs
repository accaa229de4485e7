//! End-to-end analysis over an in-memory Actions API.

use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::io::{AsyncWrite, AsyncWriteExt as _};
use trawl_core::{Analyzer, AnalyzerConfig, RunOutcome};
use trawl_github::{
    ActionsApi, Artifact, GithubError, GithubResult, Page, RateLimitKind, RepoSlug, Workflow,
    WorkflowRun,
};
use zip::write::SimpleFileOptions;

/// Older runs download faster, so workers finish in reverse order.
struct SlowestFirst {
    runs: Vec<WorkflowRun>,
    archives: HashMap<u64, Vec<u8>>,
    artifact_calls: AtomicUsize,
}

#[async_trait]
impl ActionsApi for SlowestFirst {
    async fn list_workflows(&self, _repo: &RepoSlug) -> GithubResult<Vec<Workflow>> {
        Ok(vec![Workflow {
            id: 1,
            name: "Tests".into(),
            path: ".github/workflows/tests.yaml".into(),
            state: "active".into(),
        }])
    }

    async fn list_runs(
        &self,
        _repo: &RepoSlug,
        _workflow_id: u64,
        _branch: &str,
        _page: u32,
    ) -> GithubResult<Page<WorkflowRun>> {
        Ok(Page::last(self.runs.clone()))
    }

    async fn list_artifacts(&self, _repo: &RepoSlug, run_id: u64) -> GithubResult<Vec<Artifact>> {
        // The very first listing is throttled.
        if self.artifact_calls.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(GithubError::RateLimited {
                kind: RateLimitKind::Secondary,
                reset_at: Utc::now(),
            });
        }
        Ok(vec![Artifact {
            id: run_id,
            name: format!("junit-{run_id}"),
            size_in_bytes: 0,
            expired: false,
        }])
    }

    async fn download_artifact(
        &self,
        _repo: &RepoSlug,
        artifact_id: u64,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> GithubResult<u64> {
        tokio::time::sleep(Duration::from_millis(artifact_id * 20)).await;
        let archive = &self.archives[&artifact_id];
        sink.write_all(archive).await?;
        Ok(archive.len() as u64)
    }
}

fn report_zip(failing: &[&str]) -> Vec<u8> {
    let mut xml = String::from("<testsuites><testsuite name=\"server\">");
    for name in failing {
        xml.push_str(&format!(
            "<testcase classname=\"go.etcd.io/etcd/server\" name=\"{name}\"><failure/></testcase>"
        ));
    }
    xml.push_str("<testcase classname=\"go.etcd.io/etcd/server\" name=\"TestOk\"/>");
    xml.push_str("</testsuite></testsuites>");

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("junit_01.xml", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(xml.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}

fn run(id: u64, minutes_ago: i64) -> WorkflowRun {
    WorkflowRun {
        id,
        workflow_id: 1,
        created_at: Utc::now() - chrono::Duration::minutes(minutes_ago),
        head_branch: Some("main".into()),
        status: Some("completed".into()),
        conclusion: Some("failure".into()),
    }
}

#[tokio::test]
async fn test_results_follow_run_order_not_completion_order() {
    let api = Arc::new(SlowestFirst {
        runs: vec![run(4, 0), run(3, 1), run(2, 2), run(1, 3)],
        archives: HashMap::from([
            (4, report_zip(&["TestWatch"])),
            (3, report_zip(&["TestWatch", "TestLease"])),
            (2, report_zip(&[])),
            (1, report_zip(&["TestWatch"])),
        ]),
        artifact_calls: AtomicUsize::new(0),
    });

    let config = AnalyzerConfig::new(RepoSlug::parse("etcd-io/etcd").unwrap(), "main")
        .with_concurrency(4);
    let analysis = Analyzer::new(api, config).analyze().await.unwrap();

    let workflow = &analysis.workflows[0];
    let ids: Vec<u64> = workflow.runs.iter().map(|r| r.run.id).collect();
    assert_eq!(ids, vec![4, 3, 2, 1]);
    assert!(workflow
        .runs
        .iter()
        .all(|r| matches!(r.outcome, RunOutcome::Reported(_))));

    assert_eq!(workflow.summary.total_runs, 4);
    assert_eq!(workflow.summary.passed_runs, 1);
    assert_eq!(workflow.summary.failed_runs, 3);
    assert!((workflow.summary.pass_fraction - 0.25).abs() < f64::EPSILON);

    let top = &workflow.failures[0];
    assert_eq!(top.test_name, "TestWatch");
    assert_eq!(top.test_package, "go.etcd.io/etcd/server");
    assert_eq!(top.failure_count, 3);
    assert_eq!(workflow.failures[1].test_name, "TestLease");
    assert_eq!(workflow.failures.len(), 2);
}
