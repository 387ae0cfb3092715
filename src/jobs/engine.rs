use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::cancel::CancellationToken;
use super::poll::{JobStatusSource, PollError, PollOutcome, Poller};
use crate::config::PollingConfig;
use crate::error::Result;
use crate::models::{
    GenerateAllRequest, GenerateAllResponse, JobProgress, JobStatus, JobStatusResponse,
    ResultsResponse, SelectedTask, TaskError,
};
use crate::normalize::{NormalizedResult, normalize};
use crate::transport::{ApiClient, RequestError};
use crate::validation::{validate_generate_request, validate_job_id, validate_topic_id};

/// Outcome of a full submit → poll → fetch → normalize run
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub job_id: String,
    pub status: JobStatus,
    pub selected: Vec<SelectedTask>,
    /// Requested targets the server did not schedule
    pub dropped: Vec<String>,
    pub progress: JobProgress,
    pub results: Vec<NormalizedResult>,
    pub failed_tasks: Vec<TaskError>,
}

impl JobReport {
    pub fn malformed_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_malformed()).count()
    }
}

/// Client for content-generation jobs
#[derive(Clone)]
pub struct ContentJobs {
    api: ApiClient,
    polling: PollingConfig,
}

impl ContentJobs {
    pub fn new(api: ApiClient, polling: PollingConfig) -> Self {
        Self { api, polling }
    }

    /// Start one job for a topic across the requested targets.
    ///
    /// The server may schedule only a subset of the targets; the rest are
    /// reported by [`GenerateAllResponse::dropped_targets`].
    pub async fn generate_all(&self, request: &GenerateAllRequest) -> Result<GenerateAllResponse> {
        validate_generate_request(request)?;
        let request = &request.with_trimmed_targets();

        let response: GenerateAllResponse = self.api.post("/content/generate-all", request).await?;
        self.api.metrics().job_submitted();

        let dropped = response.dropped_targets(request);
        if !dropped.is_empty() {
            warn!(
                job_id = %response.job_id,
                topic_id = request.topic_id,
                dropped = ?dropped,
                "Server did not schedule every requested target"
            );
        }
        info!(
            job_id = %response.job_id,
            topic_id = request.topic_id,
            selected = response.selected.len(),
            "Content job submitted"
        );
        Ok(response)
    }

    pub async fn job_status(&self, job_id: &str) -> Result<JobStatusResponse> {
        validate_job_id(job_id)?;
        Ok(self.fetch_status(job_id).await?)
    }

    /// Results of one job; repeatable once the job is terminal
    pub async fn job_results(&self, job_id: &str) -> Result<ResultsResponse> {
        validate_job_id(job_id)?;
        let results: ResultsResponse = self.api.get_segments(&["results", job_id]).await?;
        debug!(
            job_id,
            results = results.results.len(),
            errors = results.errors.len(),
            "Fetched job results"
        );
        Ok(results)
    }

    /// Every stored result for a topic, across jobs
    pub async fn topic_results(&self, topic_id: i64) -> Result<ResultsResponse> {
        validate_topic_id(topic_id)?;
        Ok(self.api.get(&format!("/results/topic/{}", topic_id)).await?)
    }

    /// Poller bound to this client's status endpoint
    pub fn poller(&self) -> Poller {
        Poller::new(
            Arc::new(self.clone()),
            self.polling.clone(),
            self.api.metrics().clone(),
        )
    }

    /// Submit, wait for a terminal status, then fetch and normalize results.
    ///
    /// A job that ends in `error` still yields a report with whatever
    /// results were produced.
    pub async fn run<F>(
        &self,
        request: &GenerateAllRequest,
        cancel: &CancellationToken,
        on_progress: F,
    ) -> Result<JobReport>
    where
        F: FnMut(&JobStatusResponse),
    {
        if cancel.is_cancelled() {
            return Err(PollError::Cancelled.into());
        }

        let submitted = self.generate_all(request).await?;
        let dropped = submitted.dropped_targets(request);

        let status = match self
            .poller()
            .poll_until_terminal(&submitted.job_id, cancel, on_progress)
            .await?
        {
            PollOutcome::Finished(status) => status,
            PollOutcome::Cancelled { .. } | PollOutcome::Superseded => {
                return Err(PollError::Cancelled.into());
            }
        };

        let fetched = self.job_results(&submitted.job_id).await?;
        let results: Vec<NormalizedResult> = fetched.results.iter().map(normalize).collect();
        for result in results.iter().filter(|r| r.is_malformed()) {
            self.api.metrics().malformed_payload();
            warn!(
                job_id = %result.job_id,
                platform = %result.platform,
                format = %result.format,
                "Result content did not match a known layout"
            );
        }

        let failed_tasks = merge_task_errors(status.errors, &fetched.errors);
        info!(
            job_id = %submitted.job_id,
            status = %status.status,
            results = results.len(),
            failed = failed_tasks.len(),
            "Content job complete"
        );

        Ok(JobReport {
            job_id: submitted.job_id,
            status: status.status,
            selected: submitted.selected,
            dropped,
            progress: status.progress,
            results,
            failed_tasks,
        })
    }

    async fn fetch_status(&self, job_id: &str) -> std::result::Result<JobStatusResponse, RequestError> {
        self.api.get_segments(&["jobs", job_id]).await
    }
}

#[async_trait]
impl JobStatusSource for ContentJobs {
    async fn job_status(&self, job_id: &str) -> std::result::Result<JobStatusResponse, RequestError> {
        self.fetch_status(job_id).await
    }
}

/// Status errors first, then result-side errors not already reported
fn merge_task_errors(mut tasks: Vec<TaskError>, result_errors: &[serde_json::Value]) -> Vec<TaskError> {
    let mut seen: BTreeSet<(String, String, String)> = tasks
        .iter()
        .map(|t| (t.task_id.clone(), t.platform.clone(), t.format.clone()))
        .collect();

    for raw in result_errors {
        let Ok(task) = serde_json::from_value::<TaskError>(raw.clone()) else {
            continue;
        };
        if seen.insert((task.task_id.clone(), task.platform.clone(), task.format.clone())) {
            tasks.push(task);
        }
    }
    tasks
}
