//! Wire models for the content-generation service.
//!
//! Topic, status and stats payloads use snake_case keys; job and result
//! payloads use camelCase (`jobId`, `taskId`) and also accept the
//! snake_case spelling. Fields with an untrusted shape go through
//! [`decode`] so that one bad value never fails the whole record.

pub mod decode;
pub mod job;
pub mod results;
pub mod status;
pub mod topic;

pub use job::{
    BrandConfig, GenerateAllRequest, GenerateAllResponse, GenerationOptions, JobProgress,
    JobStatus, JobStatusResponse, LengthLevel, SelectedTask, TaskError,
};
pub use results::{ContentResult, ResultsResponse};
pub use status::{DailyCount, ProcessingStatus, StatsSnapshot};
pub use topic::{MessageResponse, SubmitTopicsRequest, SubmitTopicsResponse, Topic, TopicStatus};
