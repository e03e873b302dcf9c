//! Concurrent, append-only metric buckets

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use crate::summary::{MetricsSummary, StageSummary};

/// Free-form attributes attached to a single entry (attempt number, page size, ...)
pub type Extra = BTreeMap<String, Value>;

/// Single request metric
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricEntry {
    pub duration_ms: f64,
    pub status_code: Option<u16>,
    pub ok: bool,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: Extra,
}

impl MetricEntry {
    pub fn new(duration_ms: f64, status_code: Option<u16>, ok: bool) -> Self {
        Self {
            duration_ms,
            status_code,
            ok,
            extra: Extra::new(),
        }
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Collects latency and status metrics grouped by stage name.
///
/// Cloning is cheap and every clone writes into the same buckets.
#[derive(Debug, Clone, Default)]
pub struct MetricsRecorder {
    stages: Arc<Mutex<BTreeMap<String, Vec<MetricEntry>>>>,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one attempt that started at `start` and finished now
    pub fn record(&self, stage: &str, start: Instant, status_code: Option<u16>, ok: bool) {
        self.record_with(stage, start, status_code, ok, Extra::new());
    }

    /// Record one attempt with extra attributes
    pub fn record_with(
        &self,
        stage: &str,
        start: Instant,
        status_code: Option<u16>,
        ok: bool,
        extra: Extra,
    ) {
        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
        self.record_entry(
            stage,
            MetricEntry {
                duration_ms,
                status_code,
                ok,
                extra,
            },
        );
    }

    /// Append an already-measured entry
    pub fn record_entry(&self, stage: &str, entry: MetricEntry) {
        let mut stages = self.stages.lock();
        match stages.get_mut(stage) {
            Some(bucket) => bucket.push(entry),
            None => {
                stages.insert(stage.to_string(), vec![entry]);
            }
        }
    }

    /// Names of every stage that has at least one entry
    pub fn stage_names(&self) -> Vec<String> {
        self.stages.lock().keys().cloned().collect()
    }

    /// Snapshot of one stage's entries in completion order
    pub fn entries(&self, stage: &str) -> Vec<MetricEntry> {
        self.stages.lock().get(stage).cloned().unwrap_or_default()
    }

    /// Number of entries recorded for a stage
    pub fn count(&self, stage: &str) -> usize {
        self.stages.lock().get(stage).map_or(0, Vec::len)
    }

    /// Number of entries across all stages
    pub fn total_count(&self) -> usize {
        self.stages.lock().values().map(Vec::len).sum()
    }

    /// Aggregate every stage. Pure read: repeated calls see the same data
    /// unless new entries were recorded in between.
    pub fn summary(&self) -> MetricsSummary {
        // Copy durations out so sorting happens outside the lock
        let snapshot: Vec<(String, Vec<MetricEntry>)> = self
            .stages
            .lock()
            .iter()
            .map(|(stage, entries)| (stage.clone(), entries.clone()))
            .collect();

        snapshot
            .into_iter()
            .map(|(stage, entries)| (stage, StageSummary::from_entries(&entries)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_record_appends_to_stage() {
        let metrics = MetricsRecorder::new();
        let start = Instant::now();

        metrics.record("signup", start, Some(201), true);
        metrics.record("signup", start, Some(409), false);
        metrics.record("add_row", start, None, false);

        assert_eq!(metrics.count("signup"), 2);
        assert_eq!(metrics.count("add_row"), 1);
        assert_eq!(metrics.count("search"), 0);
        assert_eq!(metrics.total_count(), 3);
        assert_eq!(metrics.stage_names(), vec!["add_row", "signup"]);
    }

    #[test]
    fn test_duration_measured_from_start() {
        let metrics = MetricsRecorder::new();
        let start = Instant::now() - Duration::from_millis(40);

        metrics.record("search", start, Some(200), true);

        let entry = &metrics.entries("search")[0];
        assert!(entry.duration_ms >= 40.0, "{}", entry.duration_ms);
        assert_eq!(entry.status_code, Some(200));
        assert!(entry.ok);
    }

    #[test]
    fn test_extra_attributes_kept() {
        let metrics = MetricsRecorder::new();
        let mut extra = Extra::new();
        extra.insert("attempt".to_string(), Value::from(2));

        metrics.record_with("add_row", Instant::now(), Some(503), false, extra);
        metrics.record_entry(
            "search",
            MetricEntry::new(1.5, Some(200), true).with_extra("page_size", 25),
        );

        assert_eq!(metrics.entries("add_row")[0].extra["attempt"], 2);
        assert_eq!(metrics.entries("search")[0].extra["page_size"], 25);
    }

    #[test]
    fn test_clones_share_buckets() {
        let metrics = MetricsRecorder::new();
        let clone = metrics.clone();
        clone.record("signup", Instant::now(), Some(200), true);
        assert_eq!(metrics.count("signup"), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_lose_nothing() {
        let metrics = MetricsRecorder::new();
        let mut handles = Vec::new();

        for writer in 0..16u16 {
            let metrics = metrics.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..500u16 {
                    let ok = i % 5 != 0;
                    let status = if ok { 200 } else { 500 + writer % 4 };
                    metrics.record("add_row", Instant::now(), Some(status), ok);
                    if i % 50 == 0 {
                        tokio::task::yield_now().await;
                    }
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let summary = metrics.summary();
        let stage = &summary["add_row"];
        assert_eq!(stage.requests, 16 * 500);
        assert_eq!(stage.success, 16 * 400);
        assert_eq!(stage.failure, 16 * 100);
        assert_eq!(stage.status_counts.values().sum::<usize>(), 16 * 500);
    }
}
