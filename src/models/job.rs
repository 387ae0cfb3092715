//! Content-generation job payloads.
//!
//! A job covers one topic and one or more targets. Each selected
//! `(platform, format)` pair is a task; the job reaches `done` or `error`
//! once every task has settled, and per-task failures are reported in
//! `errors` without discarding the tasks that succeeded.

use bon::Builder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use super::decode;

/// Length preset requested from the generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthLevel {
    Compact,
    #[default]
    Standard,
    Detailed,
}

impl FromStr for LengthLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(LengthLevel::Compact),
            "standard" => Ok(LengthLevel::Standard),
            "detailed" => Ok(LengthLevel::Detailed),
            other => Err(format!(
                "unknown length level '{}', expected compact, standard or detailed",
                other
            )),
        }
    }
}

impl fmt::Display for LengthLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LengthLevel::Compact => "compact",
            LengthLevel::Standard => "standard",
            LengthLevel::Detailed => "detailed",
        };
        f.write_str(name)
    }
}

/// Generation switches sent under `options`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Builder)]
pub struct GenerationOptions {
    #[builder(default)]
    #[serde(default)]
    pub include_images: bool,
    #[builder(default)]
    #[serde(default)]
    pub max_length_levels: LengthLevel,
    /// Bypass server-side duplicate suppression
    #[builder(default)]
    #[serde(default)]
    pub force: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length_hint: Option<u32>,
}

/// Brand voice settings forwarded verbatim to the generator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Builder)]
pub struct BrandConfig {
    #[builder(into)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[builder(into)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    #[builder(into)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
    #[builder(into)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[builder(default)]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hashtags: Vec<String>,
}

/// Body of `POST /content/generate-all`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[serde(rename_all = "camelCase")]
pub struct GenerateAllRequest {
    pub topic_id: i64,
    /// Target identifiers such as `instagram-story` or `linkedin-post`
    pub target_platforms: Vec<String>,
    #[builder(default)]
    #[serde(default)]
    pub brand: BrandConfig,
    #[builder(default)]
    #[serde(default)]
    pub options: GenerationOptions,
}

impl GenerateAllRequest {
    /// Copy with surrounding whitespace stripped from every target
    pub fn with_trimmed_targets(&self) -> Self {
        Self {
            target_platforms: self
                .target_platforms
                .iter()
                .map(|target| target.trim().to_string())
                .collect(),
            ..self.clone()
        }
    }
}

/// Lifecycle of a job; `Done` and `Error` are terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Running,
    Done,
    Error,
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Error)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobStatus::Running => "running",
            JobStatus::Done => "done",
            JobStatus::Error => "error",
            JobStatus::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// One `(platform, format)` unit the server agreed to generate
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SelectedTask {
    pub platform: String,
    #[serde(default, deserialize_with = "decode::lenient_string")]
    pub format: String,
}

/// Response of `POST /content/generate-all`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateAllResponse {
    #[serde(alias = "job_id")]
    pub job_id: String,
    #[serde(default, deserialize_with = "decode::lenient")]
    pub status: JobStatus,
    #[serde(default, deserialize_with = "decode::lenient_seq")]
    pub selected: Vec<SelectedTask>,
}

impl GenerateAllResponse {
    /// Requested targets the server left out of `selected`, in request order
    pub fn dropped_targets(&self, request: &GenerateAllRequest) -> Vec<String> {
        let selected: BTreeSet<&str> = self.selected.iter().map(|t| t.platform.as_str()).collect();
        request
            .target_platforms
            .iter()
            .map(|target| target.trim())
            .filter(|target| !selected.contains(target))
            .map(str::to_owned)
            .collect()
    }
}

/// `done / total` task counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobProgress {
    pub done: u32,
    pub total: u32,
}

/// Failure of a single task within a job
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskError {
    #[serde(alias = "task_id", deserialize_with = "decode::lenient_string")]
    pub task_id: String,
    #[serde(deserialize_with = "decode::lenient_string")]
    pub platform: String,
    #[serde(deserialize_with = "decode::lenient_string")]
    pub format: String,
    #[serde(alias = "error", deserialize_with = "decode::lenient_string")]
    pub message: String,
}

/// Response of `GET /jobs/:jobId`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusResponse {
    #[serde(alias = "job_id")]
    pub job_id: String,
    #[serde(default, deserialize_with = "decode::lenient")]
    pub status: JobStatus,
    #[serde(default, deserialize_with = "decode::lenient")]
    pub progress: JobProgress,
    #[serde(default, deserialize_with = "decode::lenient_seq")]
    pub errors: Vec<TaskError>,
}

impl JobStatusResponse {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
