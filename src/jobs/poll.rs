//! Job status polling loop.

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::cancel::CancellationToken;
use crate::config::PollingConfig;
use crate::models::JobStatusResponse;
use crate::observability::Metrics;
use crate::transport::RequestError;

#[derive(Debug, Error)]
pub enum PollError {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error("status check failed {failures} times in a row, last error: {last}")]
    TransientBudgetExhausted { failures: u32, last: RequestError },

    #[error("status for job {expected} named {received} instead, {mismatches} times in a row")]
    JobMismatch {
        expected: String,
        received: String,
        mismatches: u32,
    },

    #[error("job {job_id} still running after {waited:?}")]
    MaxWaitExceeded { job_id: String, waited: Duration },

    #[error("polling cancelled")]
    Cancelled,
}

/// How a poll loop ended without failing
#[derive(Debug, Clone)]
pub enum PollOutcome {
    /// The job reached `done` or `error`
    Finished(JobStatusResponse),
    /// The token was cancelled; `last` is the most recent applied status
    Cancelled { last: Option<JobStatusResponse> },
    /// A newer loop on the same poller took over
    Superseded,
}

/// Anything that can answer a job status query
#[async_trait]
pub trait JobStatusSource: Send + Sync {
    async fn job_status(&self, job_id: &str) -> Result<JobStatusResponse, RequestError>;
}

/// Monotonic tag for poll requests.
///
/// Only the most recently issued tag is current; a response carrying an
/// older tag arrived out of order or belongs to a superseded loop.
#[derive(Debug, Default)]
pub struct SequenceGate {
    latest: AtomicU64,
}

impl SequenceGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn is_current(&self, sequence: u64) -> bool {
        self.latest.load(Ordering::Acquire) == sequence
    }
}

/// Repeats status checks until a job settles.
///
/// Clones share one [`SequenceGate`], so starting a loop on a clone
/// supersedes any loop still running on another.
#[derive(Clone)]
pub struct Poller {
    source: Arc<dyn JobStatusSource>,
    config: PollingConfig,
    gate: Arc<SequenceGate>,
    metrics: Arc<Metrics>,
}

impl Poller {
    pub fn new(source: Arc<dyn JobStatusSource>, config: PollingConfig, metrics: Arc<Metrics>) -> Self {
        Self {
            source,
            config,
            gate: Arc::new(SequenceGate::new()),
            metrics,
        }
    }

    /// Poll `job_id` every `interval` until it is terminal.
    ///
    /// `on_progress` sees every applied status, including the terminal one.
    /// Timeouts and connection failures are retried up to
    /// `max_transient_failures` in a row; any other failure ends the loop.
    /// A status naming another job is skipped, and the same budget bounds
    /// how many of those may arrive in a row.
    pub async fn poll_until_terminal<F>(
        &self,
        job_id: &str,
        cancel: &CancellationToken,
        mut on_progress: F,
    ) -> Result<PollOutcome, PollError>
    where
        F: FnMut(&JobStatusResponse),
    {
        let started = Instant::now();
        let interval = self.config.interval.as_duration();
        let mut last: Option<JobStatusResponse> = None;
        let mut failures = 0u32;
        let mut mismatches = 0u32;
        let mut attempt = 0u64;

        loop {
            if cancel.is_cancelled() {
                info!(job_id, attempt, "Polling cancelled");
                return Ok(PollOutcome::Cancelled { last });
            }

            if let Some(max_wait) = self.config.max_wait {
                let waited = started.elapsed();
                if waited >= max_wait.as_duration() {
                    return Err(PollError::MaxWaitExceeded {
                        job_id: job_id.to_string(),
                        waited,
                    });
                }
            }

            attempt += 1;
            let sequence = self.gate.issue();
            let result = self.check(job_id).await;

            if cancel.is_cancelled() {
                debug!(job_id, attempt, "Discarding status received after cancellation");
                return Ok(PollOutcome::Cancelled { last });
            }
            if !self.gate.is_current(sequence) {
                debug!(job_id, sequence, "Discarding stale status, newer poll in progress");
                return Ok(PollOutcome::Superseded);
            }

            match result {
                Ok(status) if !status.job_id.is_empty() && status.job_id != job_id => {
                    mismatches += 1;
                    warn!(
                        job_id,
                        received = %status.job_id,
                        mismatches,
                        "Ignoring status for a different job"
                    );
                    if mismatches >= self.config.max_transient_failures {
                        return Err(PollError::JobMismatch {
                            expected: job_id.to_string(),
                            received: status.job_id,
                            mismatches,
                        });
                    }
                }
                Ok(status) => {
                    failures = 0;
                    mismatches = 0;
                    debug!(
                        job_id,
                        attempt,
                        status = %status.status,
                        done = status.progress.done,
                        total = status.progress.total,
                        "Job status"
                    );
                    on_progress(&status);
                    if status.is_terminal() {
                        info!(
                            job_id,
                            status = %status.status,
                            failed_tasks = status.errors.len(),
                            "Job finished"
                        );
                        return Ok(PollOutcome::Finished(status));
                    }
                    last = Some(status);
                }
                Err(err) if err.is_transient() => {
                    failures += 1;
                    self.metrics.transient_poll_failure();
                    warn!(
                        job_id,
                        attempt,
                        failures,
                        error = %err,
                        "Transient status check failure"
                    );
                    if failures >= self.config.max_transient_failures {
                        return Err(PollError::TransientBudgetExhausted { failures, last: err });
                    }
                }
                Err(err) => return Err(PollError::Request(err)),
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    info!(job_id, attempt, "Polling cancelled");
                    return Ok(PollOutcome::Cancelled { last });
                }
                _ = tokio::time::sleep(interval) => {}
            }
        }
    }

    /// One status check bounded by `status_timeout`
    async fn check(&self, job_id: &str) -> Result<JobStatusResponse, RequestError> {
        self.metrics.status_polled();
        let timeout = self.config.status_timeout.as_duration();
        match tokio::time::timeout(timeout, self.source.job_status(job_id)).await {
            Ok(result) => result,
            Err(_) => Err(RequestError::Timeout),
        }
    }
}
