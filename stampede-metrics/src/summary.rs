//! Per-stage aggregation and percentile math

use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::Index;

use crate::recorder::MetricEntry;

/// Histogram key used for attempts that never received a status code
pub const NO_STATUS: &str = "none";

/// Aggregate statistics of one stage.
///
/// Latency fields are `NaN` when the stage has no entries; they serialize
/// to JSON `null`. Fields are declared in alphabetical order so the JSON
/// keys come out sorted.
#[derive(Debug, Clone, Serialize)]
pub struct StageSummary {
    pub avg_ms: f64,
    pub failure: usize,
    pub max_ms: f64,
    pub min_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub requests: usize,
    pub status_counts: BTreeMap<String, usize>,
    pub success: usize,
}

impl StageSummary {
    pub fn from_entries(entries: &[MetricEntry]) -> Self {
        let success = entries.iter().filter(|entry| entry.ok).count();

        let mut status_counts = BTreeMap::new();
        for entry in entries {
            let key = entry
                .status_code
                .map_or_else(|| NO_STATUS.to_string(), |status| status.to_string());
            *status_counts.entry(key).or_insert(0) += 1;
        }

        let mut durations: Vec<f64> = entries.iter().map(|entry| entry.duration_ms).collect();
        durations.sort_by(f64::total_cmp);

        let (avg_ms, min_ms, max_ms) = match (durations.first(), durations.last()) {
            (Some(&min), Some(&max)) => {
                let avg = durations.iter().sum::<f64>() / durations.len() as f64;
                (avg, min, max)
            }
            _ => (f64::NAN, f64::NAN, f64::NAN),
        };

        Self {
            requests: entries.len(),
            success,
            failure: entries.len() - success,
            status_counts,
            avg_ms,
            min_ms,
            max_ms,
            p50_ms: percentile(&durations, 0.50),
            p95_ms: percentile(&durations, 0.95),
        }
    }

    /// Requests per second over the given wall-clock window
    pub fn throughput(&self, elapsed_secs: f64) -> f64 {
        if elapsed_secs > 0.0 {
            self.requests as f64 / elapsed_secs
        } else {
            f64::NAN
        }
    }

    /// Count of entries that carried the given status
    pub fn status_count(&self, status: Option<u16>) -> usize {
        let key = status.map_or_else(|| NO_STATUS.to_string(), |s| s.to_string());
        self.status_counts.get(&key).copied().unwrap_or(0)
    }
}

/// Interpolated percentile of an ascending-sorted slice.
///
/// With `k = (n - 1) * q` the result interpolates linearly between the
/// order statistics at `floor(k)` and `ceil(k)`. Empty input yields `NaN`.
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let q = q.clamp(0.0, 1.0);
    let k = (sorted.len() - 1) as f64 * q;
    let floor = k.floor();
    let ceil = k.ceil();
    if floor == ceil {
        return sorted[k as usize];
    }
    let lower = sorted[floor as usize] * (ceil - k);
    let upper = sorted[ceil as usize] * (k - floor);
    lower + upper
}

/// Summary of every stage, keyed and ordered by stage name
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct MetricsSummary {
    stages: BTreeMap<String, StageSummary>,
}

impl MetricsSummary {
    pub fn get(&self, stage: &str) -> Option<&StageSummary> {
        self.stages.get(stage)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &StageSummary)> {
        self.stages.iter()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Attempts recorded across all stages
    pub fn total_requests(&self) -> usize {
        self.stages.values().map(|stage| stage.requests).sum()
    }

    /// Failed attempts recorded across all stages
    pub fn total_failures(&self) -> usize {
        self.stages.values().map(|stage| stage.failure).sum()
    }

    /// Render as indented JSON with sorted keys
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl FromIterator<(String, StageSummary)> for MetricsSummary {
    fn from_iter<I: IntoIterator<Item = (String, StageSummary)>>(iter: I) -> Self {
        Self {
            stages: iter.into_iter().collect(),
        }
    }
}

impl Index<&str> for MetricsSummary {
    type Output = StageSummary;

    fn index(&self, stage: &str) -> &StageSummary {
        &self.stages[stage]
    }
}
