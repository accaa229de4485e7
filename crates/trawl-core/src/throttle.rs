//! Shared rate-limit suspension point.
//!
//! Every API call made by the analyzer goes through one [`RateLimitGate`].
//! When any call reports a primary or secondary rate limit, the gate's resume
//! time moves forward to the reported reset and all callers sleep until then
//! before issuing their next request. Nothing retries without waiting.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tracing::{debug, info};
use trawl_github::GithubResult;

/// Floor applied when the reported reset is already in the past.
const MIN_WAIT: Duration = Duration::from_secs(1);

#[derive(Debug, Default)]
pub struct RateLimitGate {
    resume_at: Mutex<Option<Instant>>,
}

impl RateLimitGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push the resume time to the wall-clock `reset_at` (never moves it
    /// backwards). The reset is converted to a monotonic deadline once.
    pub fn trip(&self, reset_at: DateTime<Utc>) {
        let wait = (reset_at - Utc::now())
            .to_std()
            .unwrap_or(Duration::ZERO)
            .max(MIN_WAIT);
        let target = Instant::now() + wait;

        let mut resume_at = self.resume_at.lock().unwrap_or_else(|e| e.into_inner());
        if resume_at.map_or(true, |current| target > current) {
            *resume_at = Some(target);
        }
    }

    /// Time until requests may resume, if the gate is closed.
    pub fn remaining(&self) -> Option<Duration> {
        let resume_at = *self.resume_at.lock().unwrap_or_else(|e| e.into_inner());
        resume_at
            .map(|at| at.saturating_duration_since(Instant::now()))
            .filter(|d| !d.is_zero())
    }

    /// Sleep until the gate opens.
    pub async fn wait(&self) {
        if let Some(remaining) = self.remaining() {
            debug!(wait_ms = remaining.as_millis() as u64, "waiting for rate limit reset");
            tokio::time::sleep(remaining).await;
        }
    }

    /// Run `op`, waiting out and retrying rate limits; other errors are returned.
    pub async fn call<T, F, Fut>(&self, what: &str, mut op: F) -> GithubResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = GithubResult<T>>,
    {
        loop {
            self.wait().await;

            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => match err.rate_limit_reset() {
                    Some((kind, reset_at)) => {
                        info!(
                            operation = what,
                            kind = %kind,
                            reset_at = %reset_at,
                            "hit rate limit, suspending until reset"
                        );
                        self.trip(reset_at);
                    }
                    None => return Err(err),
                },
            }
        }
    }
}
