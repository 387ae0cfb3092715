//! Topic records and bulk-ingestion payloads.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::decode;

/// Server-side processing state of a topic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicStatus {
    #[default]
    Pending,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

/// A generated system design topic.
///
/// Collection fields arrive as JSON-encoded text and are decoded once here;
/// a field that fails to decode is left empty without affecting its siblings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    pub id: i64,
    #[serde(default, deserialize_with = "decode::lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "decode::lenient_string")]
    pub description: String,
    #[serde(default, deserialize_with = "decode::lenient_string")]
    pub category: String,
    #[serde(default, deserialize_with = "decode::lenient_string")]
    pub company: String,
    #[serde(default, deserialize_with = "decode::lenient_string")]
    pub complexity_level: String,
    #[serde(default, deserialize_with = "decode::lenient_string")]
    pub difficulty: String,
    #[serde(default, deserialize_with = "decode::lenient")]
    pub status: TopicStatus,
    #[serde(default, deserialize_with = "decode::lenient_opt_string")]
    pub error_message: Option<String>,
    #[serde(default, deserialize_with = "decode::lenient_opt_string")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "decode::lenient_opt_string")]
    pub updated_at: Option<String>,

    #[serde(default, deserialize_with = "decode::encoded")]
    pub technologies: Vec<String>,
    #[serde(default, deserialize_with = "decode::encoded")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "decode::encoded")]
    pub related_topics: Vec<i64>,
    #[serde(default, deserialize_with = "decode::encoded_string_map")]
    pub metrics: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "decode::encoded_string_map")]
    pub implementation_details: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "decode::encoded")]
    pub learning_objectives: Vec<String>,
    #[serde(default, deserialize_with = "decode::encoded")]
    pub prerequisites: Vec<String>,
}

impl Topic {
    pub fn is_failed(&self) -> bool {
        self.status == TopicStatus::Failed
    }
}

/// Body of `POST /topics`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitTopicsRequest {
    pub topics: Vec<String>,
    pub batch_size: usize,
}

/// Response of `POST /topics`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitTopicsResponse {
    #[serde(default)]
    pub message: String,
    pub total_topics: usize,
}

/// Plain acknowledgement returned by retry/delete/cleanup endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}
