//! Per-tenant workflow
//!
//! Steps run strictly in order. Signup, table creation and column
//! definition are single attempts; the first failure ends the tenant.
//! Row inserts fan out fail-soft and searches fan out fail-fast, both
//! through the retrying [`BoundedExecutor`].

use rand::rngs::StdRng;
use serde::Serialize;
use serde_json::Value;
use stampede_config::WorkloadConfig;
use stampede_execution::{AggregationMode, BoundedExecutor};
use stampede_http::{ApiResponse, Connector, HttpError, SearchRequest, SignupRequest};
use stampede_metrics::{Extra, MetricsRecorder};
use stampede_resilience::{RetryExecutor, Retryable, ShutdownSignal};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::context::{ResourceHandle, TenantContext};
use crate::error::WorkflowError;
use crate::payload;
use crate::report::TenantOutcome;

/// Workflow stage; also the metrics bucket name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Signup,
    CreateTable,
    AddColumn,
    AddRow,
    Search,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Signup => "signup",
            Stage::CreateTable => "create_table",
            Stage::AddColumn => "add_column",
            Stage::AddRow => "add_row",
            Stage::Search => "search",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct RowJob {
    key: String,
    payload: Value,
}

/// One tenant's run from signup to teardown
pub struct TenantWorkflow {
    index: usize,
    workload: Arc<WorkloadConfig>,
    retry: RetryExecutor,
    metrics: MetricsRecorder,
    shutdown: ShutdownSignal,
    rng: StdRng,
}

impl TenantWorkflow {
    pub fn new(
        index: usize,
        workload: Arc<WorkloadConfig>,
        retry: RetryExecutor,
        metrics: MetricsRecorder,
        shutdown: ShutdownSignal,
        rng: StdRng,
    ) -> Self {
        Self {
            index,
            workload,
            retry,
            metrics,
            shutdown,
            rng,
        }
    }

    /// Run every step and report how far the tenant got
    pub async fn run(mut self, connector: &dyn Connector) -> TenantOutcome {
        let identity = payload::tenant_identity(self.index, &mut self.rng);
        let mut outcome = TenantOutcome::new(self.index, &identity.org_slug);

        let mut context = match self.signup(connector, identity).await {
            Ok(context) => context,
            Err(err) => {
                warn!("Tenant {} stopped: {}", self.index, err);
                outcome.fail(err);
                return outcome;
            }
        };

        let result = self.drive(&mut context).await;
        outcome.tables = context.teardown();

        match result {
            Ok(()) => info!(
                "Tenant {} finished {} table(s)",
                self.index,
                outcome.tables.len()
            ),
            Err(err) => {
                warn!("Tenant {} stopped: {}", self.index, err);
                outcome.fail(err);
            }
        }
        outcome
    }

    async fn drive(&mut self, context: &mut TenantContext) -> Result<(), WorkflowError> {
        for table_index in 0..self.workload.tables_per_tenant {
            self.check_shutdown(Stage::CreateTable)?;
            let table = self.create_table(context, table_index).await?;
            context.add_resource(table.clone());

            self.check_shutdown(Stage::AddColumn)?;
            self.define_schema(context, &table).await?;

            self.check_shutdown(Stage::AddRow)?;
            self.bulk_insert(context, &table).await?;

            self.check_shutdown(Stage::Search)?;
            self.query(context, &table).await?;
        }
        Ok(())
    }

    fn check_shutdown(&self, stage: Stage) -> Result<(), WorkflowError> {
        if self.shutdown.is_triggered() {
            return Err(WorkflowError::Cancelled { stage });
        }
        Ok(())
    }

    async fn signup(
        &mut self,
        connector: &dyn Connector,
        identity: SignupRequest,
    ) -> Result<TenantContext, WorkflowError> {
        self.check_shutdown(Stage::Signup)?;

        let api = connector
            .connect(self.index)
            .map_err(|source| WorkflowError::Connect {
                tenant: self.index,
                source,
            })?;

        let start = Instant::now();
        let result = api.signup(&identity).await;
        record_attempt(&self.metrics, Stage::Signup, start, &result, Extra::new());

        match result {
            Ok(_) => {
                debug!("Tenant {} signed up as {}", self.index, identity.email);
                Ok(TenantContext::new(self.index, identity, api))
            }
            Err(source) => Err(WorkflowError::Signup {
                email: identity.email,
                source,
            }),
        }
    }

    async fn create_table(
        &mut self,
        context: &TenantContext,
        table_index: usize,
    ) -> Result<ResourceHandle, WorkflowError> {
        let request = payload::table_request(table_index, &mut self.rng);

        let start = Instant::now();
        let result = context.api().create_table(&request).await;
        record_attempt(&self.metrics, Stage::CreateTable, start, &result, Extra::new());

        match result {
            Ok(response) => {
                debug!(
                    "Tenant {} created table {} ({})",
                    self.index, request.name, response.body
                );
                Ok(ResourceHandle {
                    name: request.name,
                    slug: response.body,
                })
            }
            Err(source) => Err(WorkflowError::CreateTable {
                name: request.name,
                source,
            }),
        }
    }

    async fn define_schema(
        &self,
        context: &TenantContext,
        table: &ResourceHandle,
    ) -> Result<(), WorkflowError> {
        for column in payload::work_item_columns() {
            let start = Instant::now();
            let result = context.api().add_column(&table.slug, &column).await;
            record_attempt(&self.metrics, Stage::AddColumn, start, &result, Extra::new());

            if let Err(source) = result {
                return Err(WorkflowError::AddColumn {
                    table: table.slug.clone(),
                    column: column.name,
                    source,
                });
            }
        }
        Ok(())
    }

    async fn bulk_insert(
        &mut self,
        context: &TenantContext,
        table: &ResourceHandle,
    ) -> Result<(), WorkflowError> {
        let jobs: Vec<Arc<RowJob>> = (0..self.workload.rows_per_table)
            .map(|row| {
                Arc::new(RowJob {
                    key: format!("{}:{}", table.slug, row),
                    payload: payload::row_payload(row, &mut self.rng),
                })
            })
            .collect();

        let api = Arc::clone(context.api());
        let metrics = self.metrics.clone();
        let slug: Arc<str> = Arc::from(table.slug.as_str());

        let executor = BoundedExecutor::new(self.workload.row_concurrency, self.retry.clone())
            .with_shutdown(self.shutdown.clone());

        let report = executor
            .run(
                jobs,
                AggregationMode::FailSoft,
                &mut self.rng,
                move |job: &Arc<RowJob>, attempt| {
                    let job = Arc::clone(job);
                    let api = Arc::clone(&api);
                    let metrics = metrics.clone();
                    let slug = Arc::clone(&slug);
                    async move {
                        let start = Instant::now();
                        let result = api.add_row(&slug, &job.key, &job.payload).await;
                        let extra = attempt_extra(attempt);
                        record_attempt(&metrics, Stage::AddRow, start, &result, extra);
                        result.map(|_| ())
                    }
                },
            )
            .await;

        info!(
            "Tenant {} inserted {}/{} row(s) into {}",
            self.index,
            report.succeeded(),
            report.total(),
            table.slug
        );

        report
            .into_result()
            .map(|_| ())
            .map_err(|source| WorkflowError::BulkInsert {
                table: table.slug.clone(),
                source,
            })
    }

    async fn query(
        &mut self,
        context: &TenantContext,
        table: &ResourceHandle,
    ) -> Result<(), WorkflowError> {
        let searches: Vec<SearchRequest> = (0..self.workload.search_requests)
            .map(|_| payload::search_payload(&mut self.rng))
            .collect();

        let api = Arc::clone(context.api());
        let metrics = self.metrics.clone();
        let slug: Arc<str> = Arc::from(table.slug.as_str());

        let executor = BoundedExecutor::new(self.workload.search_concurrency, self.retry.clone())
            .with_shutdown(self.shutdown.clone());

        let report = executor
            .run(
                searches,
                AggregationMode::FailFast,
                &mut self.rng,
                move |search: &SearchRequest, attempt| {
                    let search = search.clone();
                    let api = Arc::clone(&api);
                    let metrics = metrics.clone();
                    let slug = Arc::clone(&slug);
                    async move {
                        let start = Instant::now();
                        let result = api.search(&slug, &search).await;
                        let mut extra = attempt_extra(attempt);
                        extra.insert("pageSize".to_string(), search.page_size.into());
                        record_attempt(&metrics, Stage::Search, start, &result, extra);
                        result.map(|response| response.body.total_count)
                    }
                },
            )
            .await;

        debug!(
            "Tenant {} ran {}/{} search(es) on {}",
            self.index,
            report.succeeded(),
            report.total(),
            table.slug
        );

        report
            .into_result()
            .map(|_| ())
            .map_err(|source| WorkflowError::Query {
                table: table.slug.clone(),
                source,
            })
    }
}

fn attempt_extra(attempt: u32) -> Extra {
    let mut extra = Extra::new();
    extra.insert("attempt".to_string(), attempt.into());
    extra
}

/// Record one attempt; failures carry their error kind
fn record_attempt<T>(
    metrics: &MetricsRecorder,
    stage: Stage,
    start: Instant,
    result: &Result<ApiResponse<T>, HttpError>,
    mut extra: Extra,
) {
    let (status, ok) = match result {
        Ok(response) => (Some(response.status), true),
        Err(err) => {
            extra.insert("error".to_string(), err.kind().into());
            (err.status(), false)
        }
    };
    metrics.record_with(stage.as_str(), start, status, ok, extra);
}
