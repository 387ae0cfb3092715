//! Bulk-processing status snapshot and dashboard stats.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::decode;

/// Latest full state of a bulk topic submission.
///
/// Delivered by `GET /status` and by the push channel with the same shape.
/// A new snapshot replaces the previous one; snapshots are never merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingStatus {
    pub is_processing: bool,
    pub total_topics: u64,
    pub processed_topics: u64,
    pub skipped_topics: u64,
    pub current_batch: u64,
    pub total_batches: u64,
    #[serde(deserialize_with = "decode::lenient_string")]
    pub current_topic: String,
    #[serde(deserialize_with = "decode::lenient_seq")]
    pub errors: Vec<String>,
    #[serde(deserialize_with = "decode::lenient_seq")]
    pub event_log: Vec<String>,
}

impl ProcessingStatus {
    /// Topics that have left the queue, processed or skipped
    pub fn settled_topics(&self) -> u64 {
        self.processed_topics.saturating_add(self.skipped_topics)
    }

    /// Fraction of settled topics in `0.0..=1.0`; zero when nothing was queued
    pub fn fraction_complete(&self) -> f64 {
        if self.total_topics == 0 {
            return 0.0;
        }
        (self.settled_topics() as f64 / self.total_topics as f64).min(1.0)
    }
}

/// Count of topics created on one day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    pub date: String,
    pub count: u64,
}

/// Aggregate dashboard counts, derived server-side and passed through
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsSnapshot {
    pub total_topics: u64,
    pub by_category: BTreeMap<String, u64>,
    pub by_complexity: BTreeMap<String, u64>,
    pub by_company: BTreeMap<String, u64>,
    #[serde(deserialize_with = "decode::lenient_seq")]
    pub timeline: Vec<DailyCount>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn partial_snapshot_fills_defaults() {
        let status: ProcessingStatus = serde_json::from_value(json!({
            "is_processing": true,
            "total_topics": 10,
            "processed_topics": 4,
            "skipped_topics": 1,
            "current_topic": "Design a URL shortener"
        }))
        .unwrap();

        assert!(status.is_processing);
        assert_eq!(status.current_batch, 0);
        assert!(status.errors.is_empty());
        assert_eq!(status.settled_topics(), 5);
        assert!((status.fraction_complete() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn fraction_is_zero_for_empty_run() {
        assert_eq!(ProcessingStatus::default().fraction_complete(), 0.0);
    }

    #[test]
    fn huge_counters_saturate() {
        let status: ProcessingStatus = serde_json::from_value(json!({
            "total_topics": 3,
            "processed_topics": u64::MAX,
            "skipped_topics": 1
        }))
        .unwrap();

        assert_eq!(status.settled_topics(), u64::MAX);
        assert_eq!(status.fraction_complete(), 1.0);
    }

    #[test]
    fn stats_tolerate_bad_timeline_entries() {
        let stats: StatsSnapshot = serde_json::from_value(json!({
            "total_topics": 3,
            "by_category": {"storage": 2, "networking": 1},
            "timeline": [{"date": "2026-10-01", "count": 2}, {"date": 5}]
        }))
        .unwrap();

        assert_eq!(stats.by_category["storage"], 2);
        assert_eq!(stats.timeline.len(), 1);
        assert!(stats.by_company.is_empty());
    }
}
