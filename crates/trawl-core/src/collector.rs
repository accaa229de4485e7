//! Bounded, paginated collection of a workflow's recent runs.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use trawl_github::{ActionsApi, RepoSlug, WorkflowRun};

use crate::error::PartialCollection;
use crate::throttle::RateLimitGate;

/// Admission limits for collected runs. Zero means unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCollectionWindow {
    pub max_age: Duration,
    pub max_count: usize,
}

impl RunCollectionWindow {
    pub fn new(max_age: Duration, max_count: usize) -> Self {
        Self { max_age, max_count }
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Whether `run` may join a collection that already holds `admitted` runs.
    pub fn admits(&self, run: &WorkflowRun, now: DateTime<Utc>, admitted: usize) -> bool {
        if !self.max_age.is_zero() {
            // An age beyond chrono's range cannot exclude anything.
            if let Ok(max_age) = chrono::Duration::from_std(self.max_age) {
                if let Some(oldest) = now.checked_sub_signed(max_age) {
                    if run.created_at < oldest {
                        return false;
                    }
                }
            }
        }

        if self.max_count > 0 && admitted >= self.max_count {
            return false;
        }

        true
    }
}

/// Pages through a workflow's runs, newest first, until the window closes.
pub struct RunCollector<'a> {
    api: &'a dyn ActionsApi,
    gate: &'a RateLimitGate,
    repo: &'a RepoSlug,
    window: RunCollectionWindow,
    now: DateTime<Utc>,
}

impl<'a> RunCollector<'a> {
    pub fn new(
        api: &'a dyn ActionsApi,
        gate: &'a RateLimitGate,
        repo: &'a RepoSlug,
        window: RunCollectionWindow,
    ) -> Self {
        Self {
            api,
            gate,
            repo,
            window,
            now: Utc::now(),
        }
    }

    /// Evaluate the age window against a fixed instant instead of the clock.
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Collect the admitted runs of `workflow_id` on `branch`.
    ///
    /// Runs are listed newest first, so the first run outside the window ends
    /// the scan: no later run and no later page can be admitted. Rate limits
    /// are waited out through the shared gate and the same page is requested
    /// again. Any other error stops collection and hands back what was
    /// admitted so far.
    pub async fn collect(
        &self,
        workflow_id: u64,
        branch: &str,
    ) -> Result<Vec<WorkflowRun>, PartialCollection> {
        let mut runs: Vec<WorkflowRun> = Vec::new();
        let mut page = 1;

        loop {
            let listing = self
                .gate
                .call("list workflow runs", || {
                    self.api.list_runs(self.repo, workflow_id, branch, page)
                })
                .await;

            let listing = match listing {
                Ok(listing) => listing,
                Err(source) => {
                    return Err(PartialCollection {
                        partial: runs,
                        source,
                    })
                }
            };

            debug!(
                workflow_id,
                page,
                listed = listing.items.len(),
                admitted = runs.len(),
                "fetched run page"
            );

            let mut window_closed = false;
            for run in listing.items {
                if !self.window.admits(&run, self.now, runs.len()) {
                    window_closed = true;
                    break;
                }
                runs.push(run);
            }

            if window_closed {
                break;
            }
            if self.window.max_count > 0 && runs.len() >= self.window.max_count {
                break;
            }

            match listing.next_page {
                Some(next) if next > page => page = next,
                Some(next) => {
                    warn!(workflow_id, page, next, "next-page cursor does not advance, stopping");
                    break;
                }
                None => break,
            }
        }

        Ok(runs)
    }
}
