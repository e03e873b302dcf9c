//! Launches one workflow per tenant and gathers the run report

use rand::rngs::StdRng;
use rand::SeedableRng;
use stampede_config::{StampedeConfig, WorkloadConfig};
use stampede_http::Connector;
use stampede_metrics::MetricsRecorder;
use stampede_resilience::{RetryClassifier, RetryExecutor, RetryPolicy, ShutdownSignal};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::error::WorkflowError;
use crate::report::{RunReport, TenantOutcome};
use crate::workflow::TenantWorkflow;

/// Independent RNG for one tenant.
///
/// Seeded runs derive every tenant's stream from the run seed and the
/// tenant index; unseeded runs draw from OS entropy.
pub fn tenant_rng(seed: Option<u64>, tenant: usize) -> StdRng {
    match seed {
        Some(seed) => {
            StdRng::seed_from_u64(seed ^ (tenant as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
        }
        None => StdRng::from_entropy(),
    }
}

/// Runs the configured workload against the target service
pub struct LoadRunner {
    workload: Arc<WorkloadConfig>,
    retry: RetryExecutor,
    connector: Arc<dyn Connector>,
    metrics: MetricsRecorder,
    shutdown: ShutdownSignal,
}

impl LoadRunner {
    pub fn new(config: &StampedeConfig, connector: Arc<dyn Connector>) -> Result<Self, WorkflowError> {
        let classifier = RetryClassifier::from_config(&config.retry)
            .map_err(|e| WorkflowError::Setup(format!("retryable_body_pattern: {}", e)))?;
        let retry = RetryExecutor::new(RetryPolicy::from(&config.retry), classifier);

        Ok(Self {
            workload: Arc::new(config.workload.clone()),
            retry,
            connector,
            metrics: MetricsRecorder::new(),
            shutdown: ShutdownSignal::new(),
        })
    }

    /// Record into an existing recorder instead of a fresh one
    pub fn with_metrics(mut self, metrics: MetricsRecorder) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_shutdown(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Override the retry executor (tests use a tighter backoff window)
    pub fn with_retry(mut self, retry: RetryExecutor) -> Self {
        self.retry = retry;
        self
    }

    pub fn metrics(&self) -> &MetricsRecorder {
        &self.metrics
    }

    pub fn shutdown(&self) -> &ShutdownSignal {
        &self.shutdown
    }

    /// Run every tenant concurrently and wait for all of them.
    ///
    /// A failing tenant never stops its siblings. The summary covers every
    /// attempt recorded, including those of failed or interrupted tenants.
    pub async fn run(&self) -> RunReport {
        let started = Instant::now();
        let tenants = self.workload.tenants;
        info!(
            "Starting load: {} tenant(s), {} table(s) each, {} row(s) per table",
            tenants, self.workload.tables_per_tenant, self.workload.rows_per_table
        );

        let mut tasks = JoinSet::new();
        for tenant in 0..tenants {
            let workflow = TenantWorkflow::new(
                tenant,
                Arc::clone(&self.workload),
                self.retry.clone(),
                self.metrics.clone(),
                self.shutdown.clone(),
                tenant_rng(self.workload.seed, tenant),
            );
            let connector = Arc::clone(&self.connector);
            tasks.spawn(async move { workflow.run(connector.as_ref()).await });
        }

        let mut outcomes = Vec::with_capacity(tenants);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => error!("Tenant task did not complete: {}", e),
            }
        }

        // A tenant whose task died still gets a line in the report
        for tenant in 0..tenants {
            if !outcomes.iter().any(|outcome| outcome.tenant == tenant) {
                outcomes.push(TenantOutcome::crashed(tenant, "tenant task panicked"));
            }
        }
        outcomes.sort_by_key(|outcome| outcome.tenant);

        let report = RunReport {
            summary: self.metrics.summary(),
            tenants: outcomes,
            elapsed: started.elapsed(),
            interrupted: self.shutdown.is_triggered(),
        };

        info!(
            "Load finished in {:.2}s: {} request(s), {} failed tenant(s)",
            report.elapsed.as_secs_f64(),
            report.summary.total_requests(),
            report.failed_tenants().count()
        );
        report
    }
}
