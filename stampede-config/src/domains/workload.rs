//! Workload shape configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};
use serde::{Deserialize, Serialize};

/// How much synthetic load each run generates
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadConfig {
    /// Number of synthetic tenants, each with its own namespace
    #[serde(default = "default_tenants")]
    pub tenants: usize,

    /// Tables provisioned by each tenant
    #[serde(default = "default_tables_per_tenant")]
    pub tables_per_tenant: usize,

    /// Rows inserted into each table
    #[serde(default = "default_rows_per_table")]
    pub rows_per_table: usize,

    /// Concurrent row inserts per table
    #[serde(default = "default_row_concurrency")]
    pub row_concurrency: usize,

    /// Search requests issued per table
    #[serde(default = "default_search_requests")]
    pub search_requests: usize,

    /// Concurrent search requests per table
    #[serde(default = "default_search_concurrency")]
    pub search_concurrency: usize,

    /// Seed for reproducible runs; `None` draws from OS entropy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            tenants: default_tenants(),
            tables_per_tenant: default_tables_per_tenant(),
            rows_per_table: default_rows_per_table(),
            row_concurrency: default_row_concurrency(),
            search_requests: default_search_requests(),
            search_concurrency: default_search_concurrency(),
            seed: None,
        }
    }
}

impl Validatable for WorkloadConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.tenants, "tenants", self.domain_name())?;
        validate_positive(self.row_concurrency, "row_concurrency", self.domain_name())?;
        validate_positive(
            self.search_concurrency,
            "search_concurrency",
            self.domain_name(),
        )?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "workload"
    }
}

fn default_tenants() -> usize {
    3
}

fn default_tables_per_tenant() -> usize {
    2
}

fn default_rows_per_table() -> usize {
    2000
}

fn default_row_concurrency() -> usize {
    5
}

fn default_search_requests() -> usize {
    200
}

fn default_search_concurrency() -> usize {
    50
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workload_defaults() {
        let config = WorkloadConfig::default();
        assert_eq!(config.tenants, 3);
        assert_eq!(config.tables_per_tenant, 2);
        assert_eq!(config.rows_per_table, 2000);
        assert_eq!(config.row_concurrency, 5);
        assert_eq!(config.search_requests, 200);
        assert_eq!(config.search_concurrency, 50);
        assert!(config.seed.is_none());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut config = WorkloadConfig::default();
        assert!(config.validate().is_ok());

        config.row_concurrency = 0;
        assert!(config.validate().is_err());

        config = WorkloadConfig::default();
        config.search_concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_stages_allowed() {
        // Zero rows or zero searches simply skips that stage
        let config = WorkloadConfig {
            rows_per_table: 0,
            search_requests: 0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
