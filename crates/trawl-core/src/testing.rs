//! Test doubles and fixture builders shared by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::io::{Cursor, Write};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::io::{AsyncWrite, AsyncWriteExt as _};
use trawl_github::{
    ActionsApi, Artifact, GithubError, GithubResult, Page, RepoSlug, Workflow, WorkflowRun,
};
use zip::write::SimpleFileOptions;

pub(crate) fn run_at(id: u64, created_at: DateTime<Utc>) -> WorkflowRun {
    WorkflowRun {
        id,
        workflow_id: 7,
        created_at,
        head_branch: Some("main".into()),
        status: Some("completed".into()),
        conclusion: None,
    }
}

pub(crate) fn artifact(id: u64, name: &str) -> Artifact {
    Artifact {
        id,
        name: name.into(),
        size_in_bytes: 0,
        expired: false,
    }
}

/// In-memory zip archive. Names ending in `/` become directory entries.
pub(crate) fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().unix_permissions(0o644);
    for (name, contents) in entries {
        if name.ends_with('/') {
            writer.add_directory(*name, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(contents.as_bytes()).unwrap();
        }
    }
    writer.finish().unwrap().into_inner()
}

/// JUnit document with one suite; cases are `(classname, name, outcome)`
/// where outcome is `pass`, `fail`, `error` or `skip`.
pub(crate) fn junit_xml(suite: &str, cases: &[(&str, &str, &str)]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<testsuites>\n");
    xml.push_str(&format!("  <testsuite name=\"{}\" tests=\"{}\">\n", suite, cases.len()));
    for (classname, name, outcome) in cases {
        let body = match *outcome {
            "fail" => "<failure message=\"boom\">stack</failure>",
            "error" => "<error message=\"panic\"/>",
            "skip" => "<skipped/>",
            _ => "",
        };
        xml.push_str(&format!(
            "    <testcase classname=\"{}\" name=\"{}\" time=\"0.5\">{}</testcase>\n",
            classname, name, body
        ));
    }
    xml.push_str("  </testsuite>\n</testsuites>\n");
    xml
}

/// Canned GitHub Actions API.
#[derive(Default)]
pub(crate) struct FakeActions {
    workflows: Vec<Workflow>,
    run_pages: HashMap<u64, Vec<Vec<WorkflowRun>>>,
    run_page_errors: Mutex<HashMap<u32, VecDeque<GithubError>>>,
    artifacts: HashMap<u64, Vec<Artifact>>,
    artifact_errors: Mutex<HashMap<u64, VecDeque<GithubError>>>,
    archives: HashMap<u64, Vec<u8>>,
    download_errors: Mutex<HashMap<u64, VecDeque<GithubError>>>,
    requested_pages: Mutex<Vec<u32>>,
    downloads: Mutex<Vec<u64>>,
}

impl FakeActions {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_workflow(mut self, id: u64, name: &str) -> Self {
        self.workflows.push(Workflow {
            id,
            name: name.into(),
            path: format!(".github/workflows/{}.yaml", name.to_lowercase()),
            state: "active".into(),
        });
        self
    }

    /// Serve `runs` for `workflow_id` split into pages of `per_page`.
    pub(crate) fn with_run_pages(
        mut self,
        workflow_id: u64,
        runs: Vec<WorkflowRun>,
        per_page: usize,
    ) -> Self {
        let pages = runs.chunks(per_page).map(<[WorkflowRun]>::to_vec).collect();
        self.run_pages.insert(workflow_id, pages);
        self
    }

    /// Fail the next request for `page` once with `err`.
    pub(crate) fn with_run_page_error(self, page: u32, err: GithubError) -> Self {
        self.run_page_errors
            .lock()
            .unwrap()
            .entry(page)
            .or_default()
            .push_back(err);
        self
    }

    /// Give `run_id` an artifact whose download yields `archive`.
    pub(crate) fn with_artifact(mut self, run_id: u64, artifact: Artifact, archive: Vec<u8>) -> Self {
        self.archives.insert(artifact.id, archive);
        self.artifacts.entry(run_id).or_default().push(artifact);
        self
    }

    /// Fail the next artifact listing for `run_id` once with `err`.
    pub(crate) fn with_artifact_error(self, run_id: u64, err: GithubError) -> Self {
        self.artifact_errors
            .lock()
            .unwrap()
            .entry(run_id)
            .or_default()
            .push_back(err);
        self
    }

    /// Fail the next download of `artifact_id` once with `err`, after writing
    /// half of the archive to the sink.
    pub(crate) fn with_download_error(self, artifact_id: u64, err: GithubError) -> Self {
        self.download_errors
            .lock()
            .unwrap()
            .entry(artifact_id)
            .or_default()
            .push_back(err);
        self
    }

    pub(crate) fn run_pages_requested(&self) -> Vec<u32> {
        self.requested_pages.lock().unwrap().clone()
    }

    pub(crate) fn downloads(&self) -> Vec<u64> {
        self.downloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActionsApi for FakeActions {
    async fn list_workflows(&self, _repo: &RepoSlug) -> GithubResult<Vec<Workflow>> {
        Ok(self.workflows.clone())
    }

    async fn list_runs(
        &self,
        _repo: &RepoSlug,
        workflow_id: u64,
        _branch: &str,
        page: u32,
    ) -> GithubResult<Page<WorkflowRun>> {
        self.requested_pages.lock().unwrap().push(page);

        if let Some(err) = self
            .run_page_errors
            .lock()
            .unwrap()
            .get_mut(&page)
            .and_then(VecDeque::pop_front)
        {
            return Err(err);
        }

        let pages = self.run_pages.get(&workflow_id).cloned().unwrap_or_default();
        let index = page as usize - 1;
        let items = pages.get(index).cloned().unwrap_or_default();
        let next_page = (index + 1 < pages.len()).then(|| page + 1);
        Ok(Page { items, next_page })
    }

    async fn list_artifacts(&self, _repo: &RepoSlug, run_id: u64) -> GithubResult<Vec<Artifact>> {
        if let Some(err) = self
            .artifact_errors
            .lock()
            .unwrap()
            .get_mut(&run_id)
            .and_then(VecDeque::pop_front)
        {
            return Err(err);
        }
        Ok(self.artifacts.get(&run_id).cloned().unwrap_or_default())
    }

    async fn download_artifact(
        &self,
        _repo: &RepoSlug,
        artifact_id: u64,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> GithubResult<u64> {
        self.downloads.lock().unwrap().push(artifact_id);
        let archive = self
            .archives
            .get(&artifact_id)
            .ok_or_else(|| GithubError::NotFound {
                resource: format!("artifact {}", artifact_id),
            })?;

        let failure = self
            .download_errors
            .lock()
            .unwrap()
            .get_mut(&artifact_id)
            .and_then(VecDeque::pop_front);
        if let Some(err) = failure {
            sink.write_all(&archive[..archive.len() / 2]).await?;
            sink.flush().await?;
            return Err(err);
        }

        sink.write_all(archive).await?;
        sink.flush().await?;
        Ok(archive.len() as u64)
    }
}
