//! HTTP client for the multi-tenant table API
//!
//! [`TargetApi`] is the seam the workload drives. [`ApiClient`] implements it
//! over `reqwest` with one cookie jar per tenant, and [`HttpConnector`] builds
//! a fresh client for every tenant so sessions are never shared.

pub mod client;
pub mod config;
pub mod errors;
pub mod types;

// Re-export main types for convenience
pub use client::{ApiClient, Connector, HttpConnector, TargetApi};
pub use config::ClientSettings;
pub use errors::HttpError;
pub use types::{
    ApiResponse, ColumnDefinition, ColumnType, CreateTableRequest, CreateTableResponse,
    FilterField, SearchRequest, SearchResponse, SignupRequest, SortDirection, TableInfo,
};
