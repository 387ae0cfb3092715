//! In-process counters for the client pipeline

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics handle for recording counters
#[derive(Debug, Default)]
pub struct Metrics {
    requests_sent: AtomicU64,
    requests_failed: AtomicU64,
    jobs_submitted: AtomicU64,
    status_polls: AtomicU64,
    transient_poll_failures: AtomicU64,
    malformed_payloads: AtomicU64,
    snapshots_received: AtomicU64,
    fanout_reconnects: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_sent(&self) {
        self.requests_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn request_failed(&self) {
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "requests_failed", "Metric incremented");
    }

    pub fn job_submitted(&self) {
        self.jobs_submitted.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "jobs_submitted", "Metric incremented");
    }

    pub fn status_polled(&self) {
        self.status_polls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn transient_poll_failure(&self) {
        self.transient_poll_failures.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "transient_poll_failures", "Metric incremented");
    }

    pub fn malformed_payload(&self) {
        self.malformed_payloads.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "malformed_payloads", "Metric incremented");
    }

    pub fn snapshot_received(&self) {
        self.snapshots_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn fanout_reconnected(&self) {
        self.fanout_reconnects.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "fanout_reconnects", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_sent: self.requests_sent.load(Ordering::Relaxed),
            requests_failed: self.requests_failed.load(Ordering::Relaxed),
            jobs_submitted: self.jobs_submitted.load(Ordering::Relaxed),
            status_polls: self.status_polls.load(Ordering::Relaxed),
            transient_poll_failures: self.transient_poll_failures.load(Ordering::Relaxed),
            malformed_payloads: self.malformed_payloads.load(Ordering::Relaxed),
            snapshots_received: self.snapshots_received.load(Ordering::Relaxed),
            fanout_reconnects: self.fanout_reconnects.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub requests_sent: u64,
    pub requests_failed: u64,
    pub jobs_submitted: u64,
    pub status_polls: u64,
    pub transient_poll_failures: u64,
    pub malformed_payloads: u64,
    pub snapshots_received: u64,
    pub fanout_reconnects: u64,
}
