//! Latency and outcome metrics grouped by workload stage
//!
//! Every request attempt lands in a [`MetricsRecorder`] bucket keyed by its
//! stage name. [`MetricsRecorder::summary`] turns the raw entries into
//! per-stage counts, a status histogram and latency percentiles.

pub mod recorder;
pub mod summary;

pub use recorder::{Extra, MetricEntry, MetricsRecorder};
pub use summary::{percentile, MetricsSummary, StageSummary, NO_STATUS};
