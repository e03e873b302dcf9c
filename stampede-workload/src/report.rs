//! Run results

use serde::Serialize;
use stampede_metrics::{MetricsSummary, StageSummary};
use std::fmt;
use std::time::Duration;

use crate::context::ResourceHandle;
use crate::error::WorkflowError;
use crate::workflow::Stage;

/// How far one tenant got
#[derive(Debug, Clone, Serialize)]
pub struct TenantOutcome {
    pub tenant: usize,
    pub org_slug: String,
    pub tables: Vec<ResourceHandle>,
    pub failed_stage: Option<Stage>,
    pub error: Option<String>,
    pub cancelled: bool,
}

impl TenantOutcome {
    pub fn new(tenant: usize, org_slug: &str) -> Self {
        Self {
            tenant,
            org_slug: org_slug.to_string(),
            tables: Vec::new(),
            failed_stage: None,
            error: None,
            cancelled: false,
        }
    }

    pub fn fail(&mut self, err: WorkflowError) {
        self.failed_stage = err.stage();
        self.cancelled = err.is_cancelled();
        self.error = Some(err.to_string());
    }

    /// Outcome of a tenant task that died without reporting
    pub fn crashed(tenant: usize, message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::new(tenant, "")
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Everything a finished (or interrupted) run produced
#[derive(Debug, Clone)]
pub struct RunReport {
    pub summary: MetricsSummary,
    pub tenants: Vec<TenantOutcome>,
    pub elapsed: Duration,
    pub interrupted: bool,
}

impl RunReport {
    pub fn failed_tenants(&self) -> impl Iterator<Item = &TenantOutcome> {
        self.tenants.iter().filter(|tenant| !tenant.is_success())
    }

    /// Every tenant completed and the run was not interrupted
    pub fn is_success(&self) -> bool {
        !self.interrupted && self.tenants.iter().all(TenantOutcome::is_success)
    }

    /// Requests per second for one stage over the whole run
    pub fn throughput(&self, stage: &StageSummary) -> f64 {
        stage.throughput(self.elapsed.as_secs_f64())
    }
}

fn write_stage(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    stage: &StageSummary,
    throughput: f64,
) -> fmt::Result {
    writeln!(f, "\nStage: {}", name)?;
    writeln!(f, "  requests: {}", stage.requests)?;
    writeln!(f, "  success: {}", stage.success)?;
    writeln!(f, "  failure: {}", stage.failure)?;

    let statuses: Vec<String> = stage
        .status_counts
        .iter()
        .map(|(status, count)| format!("{}: {}", status, count))
        .collect();
    writeln!(f, "  status_counts: {{{}}}", statuses.join(", "))?;

    for (label, value) in [
        ("avg_ms", stage.avg_ms),
        ("min_ms", stage.min_ms),
        ("max_ms", stage.max_ms),
        ("p50_ms", stage.p50_ms),
        ("p95_ms", stage.p95_ms),
        ("throughput_rps", throughput),
    ] {
        writeln!(f, "  {}: {:.2}", label, value)?;
    }
    Ok(())
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Stress Test Summary ===")?;
        for (name, stage) in self.summary.iter() {
            write_stage(f, name, stage, self.throughput(stage))?;
        }

        writeln!(f, "\nTenants:")?;
        for tenant in &self.tenants {
            match &tenant.error {
                None => writeln!(
                    f,
                    "  tenant {} ({}): ok, {} table(s)",
                    tenant.tenant,
                    tenant.org_slug,
                    tenant.tables.len()
                )?,
                Some(error) => {
                    let stage = tenant.failed_stage.map_or("run", |stage| stage.as_str());
                    writeln!(
                        f,
                        "  tenant {} ({}): FAILED at {}: {}",
                        tenant.tenant, tenant.org_slug, stage, error
                    )?
                }
            }
        }

        write!(f, "\nElapsed: {:.2}s", self.elapsed.as_secs_f64())?;
        if self.interrupted {
            write!(f, " (interrupted)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stampede_metrics::{MetricEntry, MetricsRecorder};

    fn report(interrupted: bool) -> RunReport {
        let metrics = MetricsRecorder::new();
        for d in [10.0, 20.0, 30.0, 40.0] {
            metrics.record_entry("add_row", MetricEntry::new(d, Some(201), true));
        }

        let ok = TenantOutcome {
            tables: vec![ResourceHandle {
                name: "work_items_0_abcd".to_string(),
                slug: "work-items-0".to_string(),
            }],
            ..TenantOutcome::new(0, "org-0-aaaaaa")
        };
        let mut failed = TenantOutcome::new(1, "org-1-bbbbbb");
        failed.fail(WorkflowError::Cancelled {
            stage: Stage::Search,
        });

        RunReport {
            summary: metrics.summary(),
            tenants: vec![ok, failed],
            elapsed: Duration::from_secs(2),
            interrupted,
        }
    }

    #[test]
    fn test_report_rendering() {
        let rendered = report(false).to_string();
        assert!(rendered.starts_with("=== Stress Test Summary ==="));
        assert!(rendered.contains("\nStage: add_row\n  requests: 4\n"));
        assert!(rendered.contains("  status_counts: {201: 4}"));
        assert!(rendered.contains("  avg_ms: 25.00"));
        assert!(rendered.contains("  p95_ms: 38.50"));
        assert!(rendered.contains("  throughput_rps: 2.00"));
        assert!(rendered.contains("tenant 0 (org-0-aaaaaa): ok, 1 table(s)"));
        assert!(rendered.contains("tenant 1 (org-1-bbbbbb): FAILED at search"));
        assert!(rendered.ends_with("Elapsed: 2.00s"));
    }

    #[test]
    fn test_success_requires_every_tenant() {
        let report = report(false);
        assert!(!report.is_success());
        assert_eq!(report.failed_tenants().count(), 1);
        assert!(report.tenants[1].cancelled);

        let mut clean = report.clone();
        clean.tenants.truncate(1);
        assert!(clean.is_success());

        clean.interrupted = true;
        assert!(!clean.is_success());
    }
}
