//! Topic ingestion queue.
//!
//! Bulk submission is fire-and-forget from the client's point of view:
//! `submit_topics` returns once the server has accepted the batch, and
//! processing progress is observed through `GET /status` or the live
//! status channel in [`crate::fanout`].

use tracing::{debug, info};

use crate::config::IngestConfig;
use crate::error::Result;
use crate::models::{
    MessageResponse, ProcessingStatus, StatsSnapshot, SubmitTopicsRequest, SubmitTopicsResponse,
    Topic,
};
use crate::transport::ApiClient;
use crate::validation::{clean_titles, validate_topic_batch, validate_topic_id};

pub use crate::validation::parse_topic_lines;

/// Client for the topic endpoints
#[derive(Clone)]
pub struct TopicQueue {
    api: ApiClient,
    config: IngestConfig,
}

impl TopicQueue {
    pub fn new(api: ApiClient, config: IngestConfig) -> Self {
        Self { api, config }
    }

    pub fn default_batch_size(&self) -> usize {
        self.config.default_batch_size
    }

    /// Submit titles for bulk generation in one request.
    ///
    /// Titles are trimmed and blank ones dropped; an empty remainder is
    /// rejected without contacting the server.
    pub async fn submit_topics<I, S>(&self, titles: I, batch_size: usize) -> Result<SubmitTopicsResponse>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let topics = clean_titles(titles);
        validate_topic_batch(&topics, batch_size, self.config.max_topics_per_submit)?;

        let count = topics.len();
        let request = SubmitTopicsRequest { topics, batch_size };
        let response: SubmitTopicsResponse = self.api.post("/topics", &request).await?;

        info!(
            submitted = count,
            accepted = response.total_topics,
            batch_size,
            "Topics submitted"
        );
        Ok(response)
    }

    /// Submit using the configured default batch size
    pub async fn submit_text(&self, text: &str) -> Result<SubmitTopicsResponse> {
        self.submit_topics(parse_topic_lines(text), self.config.default_batch_size)
            .await
    }

    /// Re-queue a failed topic
    pub async fn retry_topic(&self, topic_id: i64) -> Result<MessageResponse> {
        validate_topic_id(topic_id)?;
        let response: MessageResponse = self
            .api
            .post(&format!("/topics/{}/retry", topic_id), &serde_json::json!({}))
            .await?;
        info!(topic_id, "Topic retry requested");
        Ok(response)
    }

    /// Current bulk-processing snapshot
    pub async fn status(&self) -> Result<ProcessingStatus> {
        let status: ProcessingStatus = self.api.get("/status").await?;
        debug!(
            processing = status.is_processing,
            processed = status.processed_topics,
            total = status.total_topics,
            "Fetched processing status"
        );
        Ok(status)
    }

    pub async fn list_topics(&self) -> Result<Vec<Topic>> {
        let topics: Vec<Topic> = self.api.get("/topics").await?;
        debug!(count = topics.len(), "Fetched topics");
        Ok(topics)
    }

    pub async fn get_topic(&self, topic_id: i64) -> Result<Topic> {
        validate_topic_id(topic_id)?;
        Ok(self.api.get(&format!("/topics/{}", topic_id)).await?)
    }

    pub async fn delete_topic(&self, topic_id: i64) -> Result<MessageResponse> {
        validate_topic_id(topic_id)?;
        let response: MessageResponse = self.api.delete(&format!("/topics/{}", topic_id)).await?;
        info!(topic_id, "Topic deleted");
        Ok(response)
    }

    /// Ask the server to remove failed topics
    pub async fn cleanup(&self) -> Result<MessageResponse> {
        let response: MessageResponse = self
            .api
            .post("/topics/cleanup", &serde_json::json!({}))
            .await?;
        info!(message = %response.message, "Topic cleanup requested");
        Ok(response)
    }

    pub async fn stats(&self) -> Result<StatsSnapshot> {
        Ok(self.api.get("/stats").await?)
    }
}
