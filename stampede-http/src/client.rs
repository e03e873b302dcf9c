//! HTTP client implementation

use crate::config::ClientSettings;
use crate::errors::HttpError;
use crate::types::{
    ApiResponse, ColumnDefinition, CreateTableRequest, CreateTableResponse, SearchRequest,
    SearchResponse, SignupRequest,
};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, trace};
use url::Url;

/// Header carrying the per-row de-duplication key
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Operations of the table API used by a tenant workflow.
///
/// Every call is a single attempt; retrying is the caller's business.
#[async_trait::async_trait]
pub trait TargetApi: Send + Sync {
    async fn signup(&self, request: &SignupRequest) -> Result<ApiResponse<()>, HttpError>;

    /// Create a table and return its slug
    async fn create_table(
        &self,
        request: &CreateTableRequest,
    ) -> Result<ApiResponse<String>, HttpError>;

    async fn add_column(
        &self,
        table: &str,
        column: &ColumnDefinition,
    ) -> Result<ApiResponse<()>, HttpError>;

    async fn add_row(
        &self,
        table: &str,
        idempotency_key: &str,
        row: &Value,
    ) -> Result<ApiResponse<()>, HttpError>;

    async fn search(
        &self,
        table: &str,
        request: &SearchRequest,
    ) -> Result<ApiResponse<SearchResponse>, HttpError>;
}

/// Opens a fresh, unshared connection for one tenant
pub trait Connector: Send + Sync {
    fn connect(&self, tenant: usize) -> Result<Arc<dyn TargetApi>, HttpError>;
}

/// `reqwest`-backed [`TargetApi`] with its own cookie jar
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str, settings: &ClientSettings) -> Result<Self, HttpError> {
        let mut base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(HttpError::InvalidUrl(base_url.to_string()));
        }
        // Keep any path prefix when joining relative endpoints
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        debug!(
            "Creating API client for {} with {}s timeout",
            base_url,
            settings.timeout.as_secs()
        );

        let http = Client::builder()
            .timeout(settings.timeout)
            .connect_timeout(settings.connect_timeout)
            .user_agent(&settings.user_agent)
            .pool_max_idle_per_host(settings.max_idle_per_host)
            .cookie_store(true)
            .build()?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, HttpError> {
        Ok(self.base_url.join(path)?)
    }

    fn table_endpoint(&self, table: &str, action: &str) -> Result<Url, HttpError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| HttpError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(&["tables", table, action]);
        Ok(url)
    }

    /// POST a JSON body; non-2xx statuses become [`HttpError::Status`]
    async fn post<B: Serialize + ?Sized>(
        &self,
        url: Url,
        body: &B,
        idempotency_key: Option<&str>,
    ) -> Result<(u16, String), HttpError> {
        trace!("POST {}", url);
        let mut request = self.http.post(url).json(body);
        if let Some(key) = idempotency_key {
            request = request.header(IDEMPOTENCY_KEY_HEADER, key);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(HttpError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok((status.as_u16(), text))
    }
}

#[async_trait::async_trait]
impl TargetApi for ApiClient {
    async fn signup(&self, request: &SignupRequest) -> Result<ApiResponse<()>, HttpError> {
        let (status, _) = self
            .post(self.endpoint("auth/signup")?, request, None)
            .await?;
        Ok(ApiResponse::new(status, ()))
    }

    async fn create_table(
        &self,
        request: &CreateTableRequest,
    ) -> Result<ApiResponse<String>, HttpError> {
        let (status, text) = self.post(self.endpoint("tables/")?, request, None).await?;
        let response: CreateTableResponse =
            serde_json::from_str(&text).map_err(|e| HttpError::InvalidBody {
                status,
                message: e.to_string(),
            })?;
        let slug = response.slug().ok_or(HttpError::MissingField {
            status,
            field: "table.slug",
        })?;
        Ok(ApiResponse::new(status, slug.to_string()))
    }

    async fn add_column(
        &self,
        table: &str,
        column: &ColumnDefinition,
    ) -> Result<ApiResponse<()>, HttpError> {
        let (status, _) = self
            .post(self.table_endpoint(table, "columns")?, column, None)
            .await?;
        Ok(ApiResponse::new(status, ()))
    }

    async fn add_row(
        &self,
        table: &str,
        idempotency_key: &str,
        row: &Value,
    ) -> Result<ApiResponse<()>, HttpError> {
        let (status, _) = self
            .post(self.table_endpoint(table, "rows")?, row, Some(idempotency_key))
            .await?;
        Ok(ApiResponse::new(status, ()))
    }

    async fn search(
        &self,
        table: &str,
        request: &SearchRequest,
    ) -> Result<ApiResponse<SearchResponse>, HttpError> {
        let (status, text) = self
            .post(self.table_endpoint(table, "search")?, request, None)
            .await?;
        let response = serde_json::from_str(&text).map_err(|e| HttpError::InvalidBody {
            status,
            message: e.to_string(),
        })?;
        Ok(ApiResponse::new(status, response))
    }
}

/// Builds one [`ApiClient`] per tenant against a fixed base URL
#[derive(Debug, Clone)]
pub struct HttpConnector {
    base_url: String,
    settings: ClientSettings,
}

impl HttpConnector {
    pub fn new(base_url: impl Into<String>, settings: ClientSettings) -> Result<Self, HttpError> {
        let base_url = base_url.into();
        Url::parse(&base_url)?;
        Ok(Self { base_url, settings })
    }
}

impl Connector for HttpConnector {
    fn connect(&self, tenant: usize) -> Result<Arc<dyn TargetApi>, HttpError> {
        debug!("Opening connection for tenant {}", tenant);
        let client = ApiClient::new(&self.base_url, &self.settings)?;
        Ok(Arc::new(client))
    }
}
