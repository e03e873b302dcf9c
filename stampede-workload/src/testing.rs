//! In-memory target service for workflow tests

use parking_lot::Mutex;
use stampede_http::{
    ApiResponse, ColumnDefinition, Connector, CreateTableRequest, HttpError, SearchRequest,
    SearchResponse, SignupRequest, TargetApi,
};
use stampede_resilience::{JitterWindow, RetryClassifier, RetryExecutor, RetryPolicy};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub type RowFault = Arc<dyn Fn(usize, u32) -> Option<HttpError> + Send + Sync>;

/// Fails row `index` on `attempt` whenever `f` returns an error
pub fn row_fault<F>(f: F) -> Option<RowFault>
where
    F: Fn(usize, u32) -> Option<HttpError> + Send + Sync + 'static,
{
    Some(Arc::new(f))
}

/// Scripted misbehaviour; the default answers every call successfully
#[derive(Clone, Default)]
pub struct Script {
    /// Status returned by signup; `None` means 201
    pub signup_status: Option<u16>,
    /// Restrict the signup failure to one tenant
    pub fail_signup_for: Option<usize>,
    pub omit_slug: bool,
    pub fail_column: Option<&'static str>,
    pub row_fault: Option<RowFault>,
    pub malformed_search: bool,
}

#[derive(Default)]
struct FakeState {
    next_table: AtomicUsize,
    opened: AtomicUsize,
    live: AtomicUsize,
    attempts: Mutex<HashMap<String, u32>>,
    rows: Mutex<HashMap<String, HashSet<String>>>,
}

pub struct FakeConnector {
    script: Script,
    state: Arc<FakeState>,
}

impl FakeConnector {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            state: Arc::new(FakeState::default()),
        }
    }

    pub fn connections_opened(&self) -> usize {
        self.state.opened.load(Ordering::SeqCst)
    }

    pub fn live_connections(&self) -> usize {
        self.state.live.load(Ordering::SeqCst)
    }

    /// Distinct rows stored for a table
    pub fn rows_for(&self, slug: &str) -> usize {
        self.state.rows.lock().get(slug).map_or(0, HashSet::len)
    }
}

impl Connector for FakeConnector {
    fn connect(&self, tenant: usize) -> Result<Arc<dyn TargetApi>, HttpError> {
        self.state.opened.fetch_add(1, Ordering::SeqCst);
        self.state.live.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(FakeApi {
            tenant,
            script: self.script.clone(),
            state: Arc::clone(&self.state),
        }))
    }
}

struct FakeApi {
    tenant: usize,
    script: Script,
    state: Arc<FakeState>,
}

impl Drop for FakeApi {
    fn drop(&mut self) {
        self.state.live.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl TargetApi for FakeApi {
    async fn signup(&self, _request: &SignupRequest) -> Result<ApiResponse<()>, HttpError> {
        if let Some(status) = self.script.signup_status {
            if self.script.fail_signup_for.map_or(true, |t| t == self.tenant) {
                return Err(HttpError::Status {
                    status,
                    body: "signup rejected".to_string(),
                });
            }
        }
        Ok(ApiResponse::new(201, ()))
    }

    async fn create_table(
        &self,
        request: &CreateTableRequest,
    ) -> Result<ApiResponse<String>, HttpError> {
        if self.script.omit_slug {
            return Err(HttpError::MissingField {
                status: 201,
                field: "table.slug",
            });
        }
        let n = self.state.next_table.fetch_add(1, Ordering::SeqCst);
        Ok(ApiResponse::new(
            201,
            format!("t{}-{}-{}", self.tenant, request.name.replace('_', "-"), n),
        ))
    }

    async fn add_column(
        &self,
        _table: &str,
        column: &ColumnDefinition,
    ) -> Result<ApiResponse<()>, HttpError> {
        if self.script.fail_column == Some(column.name.as_str()) {
            return Err(HttpError::Status {
                status: 400,
                body: "invalid field".to_string(),
            });
        }
        Ok(ApiResponse::new(201, ()))
    }

    async fn add_row(
        &self,
        table: &str,
        idempotency_key: &str,
        _row: &Value,
    ) -> Result<ApiResponse<()>, HttpError> {
        tokio::task::yield_now().await;

        let attempt = {
            let mut attempts = self.state.attempts.lock();
            let count = attempts.entry(idempotency_key.to_string()).or_insert(0);
            *count += 1;
            *count
        };
        let row = idempotency_key
            .rsplit_once(':')
            .and_then(|(_, index)| index.parse().ok())
            .unwrap_or(usize::MAX);

        if let Some(fault) = &self.script.row_fault {
            if let Some(err) = fault(row, attempt) {
                return Err(err);
            }
        }

        self.state
            .rows
            .lock()
            .entry(table.to_string())
            .or_default()
            .insert(idempotency_key.to_string());
        Ok(ApiResponse::new(201, ()))
    }

    async fn search(
        &self,
        _table: &str,
        _request: &SearchRequest,
    ) -> Result<ApiResponse<SearchResponse>, HttpError> {
        tokio::task::yield_now().await;

        if self.script.malformed_search {
            return Err(HttpError::InvalidBody {
                status: 200,
                message: "missing field `content`".to_string(),
            });
        }
        Ok(ApiResponse::new(
            200,
            SearchResponse {
                content: Vec::new(),
                total_count: 0,
                columns: Vec::new(),
            },
        ))
    }
}

/// Default retry budget with a 1-2ms backoff window
pub fn fast_retry() -> RetryExecutor {
    RetryExecutor::new(
        RetryPolicy {
            max_attempts: 4,
            backoff: JitterWindow::new(Duration::from_millis(1), Duration::from_millis(2)),
        },
        RetryClassifier::default(),
    )
}
