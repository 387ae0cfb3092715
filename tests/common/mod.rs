//! In-process mock of the content-generation service.
//!
//! Jobs:
//! - `job-1`: selected targets finish one per poll, then `done`
//! - `job-partial`: like `job-1` but ends in `error` with one failed task
//! - `job-slow`: the first status check hangs, later ones report `done`
//! - `job-stuck`: never leaves `running`
//! - anything else: 404 without an `error` field

#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::time::{Duration, sleep};
use topicforge::config::Config;

pub const SUPPORTED_TARGETS: &[&str] = &["instagram-story", "instagram-carousel", "x-thread"];

#[derive(Default)]
pub struct MockState {
    pub topic_submissions: Mutex<Vec<Value>>,
    pub generate_requests: Mutex<Vec<Value>>,
    pub status_polls: Mutex<Vec<String>>,
    pub status_reads: AtomicUsize,
    pub stream_opens: AtomicUsize,
}

impl MockState {
    pub fn topic_submission_count(&self) -> usize {
        self.topic_submissions.lock().unwrap().len()
    }

    pub fn polls_for(&self, job_id: &str) -> usize {
        self.status_polls
            .lock()
            .unwrap()
            .iter()
            .filter(|id| id.as_str() == job_id)
            .count()
    }
}

pub struct MockService {
    pub base_url: String,
    pub state: Arc<MockState>,
}

impl MockService {
    /// Client configuration pointing at this server with fast polling
    pub fn config(&self) -> Config {
        let config_toml = format!(
            r#"
[client]
base_url = "{}"
request_timeout = "5s"

[polling]
interval = "10ms"
status_timeout = "150ms"
max_transient_failures = 3

[fanout]
reconnect_delay = "20ms"
poll_interval = "10ms"
"#,
            self.base_url
        );

        toml::from_str(&config_toml).expect("Failed to parse test config")
    }
}

pub async fn start_mock_server() -> MockService {
    let state = Arc::new(MockState::default());

    let app = Router::new()
        .route("/api/topics", post(submit_topics).get(list_topics))
        .route("/api/topics/cleanup", post(cleanup))
        .route("/api/topics/{id}", get(get_topic).delete(delete_topic))
        .route("/api/topics/{id}/retry", post(retry_topic))
        .route("/api/status", get(status))
        .route("/api/status/stream", get(status_stream))
        .route("/api/stats", get(stats))
        .route("/api/content/generate-all", post(generate_all))
        .route("/api/jobs/{job_id}", get(job_status))
        .route("/api/results/{job_id}", get(job_results))
        .route("/api/results/topic/{topic_id}", get(topic_results))
        .route("/api/echo/headers", get(echo_headers))
        .with_state(state.clone());

    // Bind to random available port
    let addr = SocketAddr::from(([127, 0, 0, 1], 0));
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    let bound_addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockService {
        base_url: format!("http://{}/api", bound_addr),
        state,
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({"detail": "no such resource"}))).into_response()
}

async fn submit_topics(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    let total = body["topics"].as_array().map(Vec::len).unwrap_or(0);
    state.topic_submissions.lock().unwrap().push(body);
    Json(json!({"message": "Topics queued for generation", "total_topics": total})).into_response()
}

fn topic_fixture(id: i64) -> Value {
    json!({
        "id": id,
        "title": "Design a rate limiter",
        "description": "Throttle clients fairly",
        "category": "infrastructure",
        "company": "Stripe",
        "complexity_level": "intermediate",
        "difficulty": 3,
        "status": "completed",
        "technologies": "[\"redis\", \"nginx\"]",
        "tags": "not json at all",
        "related_topics": [2, 3],
        "metrics": "{\"qps\": 50000, \"p99_ms\": \"5\"}",
        "implementation_details": null,
        "learning_objectives": "[\"token bucket\"]",
        "created_at": "2024-05-01T10:00:00Z"
    })
}

async fn list_topics() -> Json<Value> {
    let mut failed = topic_fixture(2);
    failed["status"] = json!("failed");
    failed["error_message"] = json!("generator timeout");
    Json(json!([topic_fixture(1), failed]))
}

async fn get_topic(Path(id): Path<i64>) -> Response {
    if id == 1 {
        Json(topic_fixture(1)).into_response()
    } else {
        not_found()
    }
}

async fn delete_topic(Path(id): Path<i64>) -> Response {
    if id == 1 {
        Json(json!({"message": "Topic deleted"})).into_response()
    } else {
        (StatusCode::NOT_FOUND, Json(json!({"error": "Topic not found"}))).into_response()
    }
}

async fn retry_topic(Path(id): Path<i64>) -> Response {
    match id {
        2 => Json(json!({"message": "Topic queued for retry"})).into_response(),
        13 => (StatusCode::BAD_GATEWAY, "<html>upstream unavailable</html>").into_response(),
        _ => (StatusCode::NOT_FOUND, Json(json!({"error": "Topic not found"}))).into_response(),
    }
}

async fn cleanup() -> Json<Value> {
    Json(json!({"message": "Removed 1 failed topics"}))
}

fn status_snapshot(processed: u64) -> Value {
    json!({
        "is_processing": processed < 3,
        "total_topics": 3,
        "processed_topics": processed,
        "skipped_topics": 0,
        "current_batch": 1,
        "total_batches": 1,
        "current_topic": "Design a rate limiter",
        "errors": [],
        "event_log": [format!("processed {}", processed)]
    })
}

/// Each read advances processing by one topic until all three are done
async fn status(State(state): State<Arc<MockState>>) -> Json<Value> {
    let reads = state.status_reads.fetch_add(1, Ordering::SeqCst) as u64;
    Json(status_snapshot(reads.min(3)))
}

/// Two snapshots per connection, then the stream closes
async fn status_stream(State(state): State<Arc<MockState>>) -> Response {
    let opens = state.stream_opens.fetch_add(1, Ordering::SeqCst) as u64;
    let first = status_snapshot(opens * 2);
    let second = status_snapshot(opens * 2 + 1);
    let body = format!(
        ": connected\n\nevent: heartbeat\ndata: {{}}\n\nevent: status_update\ndata: {}\n\nevent: status_update\ndata: not-json\n\nevent: status_update\ndata: {}\n\n",
        first, second
    );
    ([(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
}

async fn stats() -> Json<Value> {
    Json(json!({
        "total_topics": 12,
        "by_category": {"infrastructure": 7, "databases": 5},
        "by_complexity": {"intermediate": 12},
        "by_company": {"Stripe": 4},
        "timeline": [{"date": "2024-05-01", "count": 3}, {"date": "2024-05-02", "count": 9}]
    }))
}

async fn generate_all(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    state.generate_requests.lock().unwrap().push(body.clone());

    let topic_id = body["topicId"].as_i64().unwrap_or(0);
    if topic_id == 404 {
        return (StatusCode::NOT_FOUND, Json(json!({"error": "Topic not found"}))).into_response();
    }

    let selected: Vec<Value> = body["targetPlatforms"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .filter(|target| SUPPORTED_TARGETS.contains(target))
        .map(|target| {
            let format = target.rsplit('-').next().unwrap_or_default();
            json!({"platform": target, "format": format})
        })
        .collect();

    let job_id = match topic_id {
        2 => "job-partial",
        3 => "job-slow",
        4 => "job-stuck",
        _ => "job-1",
    };

    Json(json!({"jobId": job_id, "status": "running", "selected": selected})).into_response()
}

async fn job_status(State(state): State<Arc<MockState>>, Path(job_id): Path<String>) -> Response {
    let poll = {
        let mut polls = state.status_polls.lock().unwrap();
        polls.push(job_id.clone());
        polls.iter().filter(|id| **id == job_id).count() as u64
    };

    match job_id.as_str() {
        "job-1" => {
            let done = poll.min(2);
            let status = if done == 2 { "done" } else { "running" };
            Json(json!({"jobId": job_id, "status": status, "progress": {"done": done, "total": 2}, "errors": []}))
                .into_response()
        }
        "job-partial" => {
            let done = poll.min(2);
            let (status, errors) = if done == 2 {
                (
                    "error",
                    json!([{"taskId": "t2", "platform": "x-thread", "format": "thread", "message": "quota exceeded"}]),
                )
            } else {
                ("running", json!([]))
            };
            Json(json!({"jobId": job_id, "status": status, "progress": {"done": done, "total": 2}, "errors": errors}))
                .into_response()
        }
        "job-slow" => {
            if poll == 1 {
                sleep(Duration::from_millis(600)).await;
            }
            Json(json!({"job_id": job_id, "status": "done", "progress": {"done": 1, "total": 1}})).into_response()
        }
        "job-stuck" => Json(json!({"jobId": job_id, "status": "running", "progress": {"done": 0, "total": 1}}))
            .into_response(),
        _ => not_found(),
    }
}

fn story_envelope() -> Value {
    json!({
        "content": {
            "meta": {"model": "gen-2", "tokens": 812},
            "content": {
                "frames": [
                    {"headline": "Rate limiting 101", "text": "Why APIs throttle"},
                    {"text": "Token bucket explained", "visualPrompt": "bucket of tokens"},
                    "stray frame"
                ],
                "stickers": {"sticker_ideas": ["poll: ever been rate limited?"]},
                "overlay_hashtags": ["#systemdesign"],
                "compliance": {"checks": ["no competitor names"]}
            }
        }
    })
}

async fn job_results(Path(job_id): Path<String>) -> Response {
    match job_id.as_str() {
        "job-1" => Json(json!({
            "results": [
                {"jobId": "job-1", "platform": "instagram-story", "format": "story", "topicId": 1, "envelope": story_envelope()},
                {"jobId": "job-1", "platform": "x-thread", "format": "thread", "topicId": 1,
                 "envelope": {"content": {"tweets": [{"text": "1/ Rate limiters protect APIs"}, {"text": "2/ Token bucket"}]}}}
            ],
            "errors": []
        }))
        .into_response(),
        "job-partial" => Json(json!({
            "results": [
                {"jobId": "job-partial", "platform": "instagram-story", "format": "story", "envelope": story_envelope()},
                {"jobId": "job-partial", "platform": "instagram-carousel", "format": "carousel",
                 "envelope": {"content": {"slides": "should be a list"}}}
            ],
            "errors": [
                {"taskId": "t2", "platform": "x-thread", "format": "thread", "error": "quota exceeded"}
            ]
        }))
        .into_response(),
        "job-slow" => Json(json!({"results": [], "errors": []})).into_response(),
        _ => not_found(),
    }
}

async fn topic_results(Path(topic_id): Path<i64>) -> Json<Value> {
    Json(json!({
        "results": [
            {"jobId": "job-1", "platform": "linkedin-post", "format": "post", "topicId": topic_id,
             "envelope": {"content": {"body": "Rate limiting keeps APIs healthy", "hashtags": ["#api"]}}}
        ],
        "errors": []
    }))
}

/// Request headers as a JSON object, for checking what the client sent
async fn echo_headers(headers: HeaderMap) -> Json<Value> {
    let echoed: serde_json::Map<String, Value> = headers
        .iter()
        .map(|(name, value)| {
            let value = value.to_str().unwrap_or_default().to_string();
            (name.as_str().to_string(), Value::String(value))
        })
        .collect();
    Json(Value::Object(echoed))
}
