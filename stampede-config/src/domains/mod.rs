//! Domain-specific configuration modules

pub mod http;
pub mod logging;
pub mod output;
pub mod retry;
pub mod target;
pub mod utils;
pub mod workload;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Complete configuration of a load run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StampedeConfig {
    /// Service under test
    #[serde(default)]
    pub target: target::TargetConfig,

    /// Tenant/table/row counts and concurrency limits
    #[serde(default)]
    pub workload: workload::WorkloadConfig,

    /// Retry budget and transient failure signatures
    #[serde(default)]
    pub retry: retry::RetryConfig,

    /// HTTP client configuration
    #[serde(default)]
    pub http: http::HttpConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: logging::LoggingConfig,

    /// Report output configuration
    #[serde(default)]
    pub output: output::OutputConfig,
}

impl StampedeConfig {
    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.target.validate()?;
        self.workload.validate()?;
        self.retry.validate()?;
        self.http.validate()?;
        self.logging.validate()?;
        self.output.validate()?;
        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let config = StampedeConfig::default();
        serde_yaml::to_string(&config)
            .unwrap_or_else(|_| "# Failed to generate sample config".to_string())
    }
}
