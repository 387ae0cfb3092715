use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::decode;

/// Generated output of one task, identified by `(job_id, platform, format)`.
///
/// `envelope.content` is platform specific and may itself be wrapped in
/// `{meta, content}`; see [`crate::normalize`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentResult {
    #[serde(default, alias = "job_id", deserialize_with = "decode::lenient_string")]
    pub job_id: String,
    #[serde(default, deserialize_with = "decode::lenient_string")]
    pub platform: String,
    #[serde(default, deserialize_with = "decode::lenient_string")]
    pub format: String,
    #[serde(
        default,
        alias = "topic_id",
        deserialize_with = "decode::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub topic_id: Option<i64>,
    #[serde(default)]
    pub envelope: Value,
}

impl ContentResult {
    pub fn key(&self) -> (&str, &str, &str) {
        (&self.job_id, &self.platform, &self.format)
    }
}

/// Response of `GET /results/:jobId` and `GET /results/topic/:topicId`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultsResponse {
    #[serde(deserialize_with = "decode::lenient_seq")]
    pub results: Vec<ContentResult>,
    #[serde(deserialize_with = "decode::lenient_seq")]
    pub errors: Vec<Value>,
}
