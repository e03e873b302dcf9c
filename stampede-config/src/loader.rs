//! Configuration loading and environment variable handling

use crate::domains::StampedeConfig;
use crate::error::{ConfigError, ConfigResult};
use std::path::Path;
use std::str::FromStr;

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader with default prefix
    pub fn new() -> Self {
        Self {
            prefix: "STAMPEDE".to_string(),
        }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load configuration from a YAML file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<StampedeConfig> {
        let path = path.as_ref();
        log::debug!("Loading configuration from {}", path.display());

        let content = std::fs::read_to_string(path)?;
        let mut config: StampedeConfig = serde_yaml::from_str(&content)?;

        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env(&self) -> ConfigResult<StampedeConfig> {
        let mut config = StampedeConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration with fallback chain
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<StampedeConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(&self, config: &mut StampedeConfig) -> ConfigResult<()> {
        if let Ok(base_url) = self.get_env_var("BASE_URL") {
            config.target.base_url = base_url;
        }

        self.apply_workload_overrides(&mut config.workload)?;
        self.apply_retry_overrides(&mut config.retry)?;
        self.apply_http_overrides(&mut config.http)?;
        self.apply_logging_overrides(&mut config.logging)?;

        if let Ok(path) = self.get_env_var("OUTPUT") {
            config.output.path = Some(path.into());
        }

        Ok(())
    }

    fn apply_workload_overrides(
        &self,
        config: &mut crate::domains::workload::WorkloadConfig,
    ) -> ConfigResult<()> {
        if let Some(tenants) = self.parse_env_var("TENANTS")? {
            config.tenants = tenants;
        }
        if let Some(tables) = self.parse_env_var("TABLES_PER_TENANT")? {
            config.tables_per_tenant = tables;
        }
        if let Some(rows) = self.parse_env_var("ROWS_PER_TABLE")? {
            config.rows_per_table = rows;
        }
        if let Some(concurrency) = self.parse_env_var("ROW_CONCURRENCY")? {
            config.row_concurrency = concurrency;
        }
        if let Some(requests) = self.parse_env_var("SEARCH_REQUESTS")? {
            config.search_requests = requests;
        }
        if let Some(concurrency) = self.parse_env_var("SEARCH_CONCURRENCY")? {
            config.search_concurrency = concurrency;
        }
        if let Some(seed) = self.parse_env_var("SEED")? {
            config.seed = Some(seed);
        }
        Ok(())
    }

    fn apply_retry_overrides(
        &self,
        config: &mut crate::domains::retry::RetryConfig,
    ) -> ConfigResult<()> {
        if let Some(attempts) = self.parse_env_var("RETRY_MAX_ATTEMPTS")? {
            config.max_attempts = attempts;
        }
        if let Some(min) = self.parse_env_var("RETRY_JITTER_MIN_MS")? {
            config.jitter_min_ms = min;
        }
        if let Some(max) = self.parse_env_var("RETRY_JITTER_MAX_MS")? {
            config.jitter_max_ms = max;
        }
        if let Ok(pattern) = self.get_env_var("RETRY_BODY_PATTERN") {
            config.retryable_body_pattern = pattern;
        }
        Ok(())
    }

    fn apply_http_overrides(
        &self,
        config: &mut crate::domains::http::HttpConfig,
    ) -> ConfigResult<()> {
        if let Some(seconds) = self.parse_env_var::<u64>("HTTP_TIMEOUT")? {
            config.timeout = std::time::Duration::from_secs(seconds);
        }
        if let Ok(user_agent) = self.get_env_var("HTTP_USER_AGENT") {
            config.user_agent = user_agent;
        }
        Ok(())
    }

    fn apply_logging_overrides(
        &self,
        config: &mut crate::domains::logging::LoggingConfig,
    ) -> ConfigResult<()> {
        if let Ok(log_level) = self.get_env_var("LOG_LEVEL") {
            config.level = crate::domains::logging::LogLevel::from_str(&log_level)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_LEVEL: {}", log_level)))?;
        }

        if let Ok(format) = self.get_env_var("LOG_FORMAT") {
            config.format = crate::domains::logging::LogFormat::from_str(&format)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_FORMAT: {}", format)))?;
        }

        Ok(())
    }

    /// Get environment variable with prefix
    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(format!("{}_{}", self.prefix, name))
    }

    /// Parse an optional prefixed environment variable
    fn parse_env_var<T>(&self, name: &str) -> ConfigResult<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get_env_var(name) {
            Ok(raw) => raw
                .parse()
                .map(Some)
                .map_err(|e| ConfigError::EnvError(format!("Invalid {}: {}", name, e))),
            Err(_) => Ok(None),
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_env_overrides() {
        temp_env::with_vars(
            [
                ("STAMPEDE_TENANTS", Some("9")),
                ("STAMPEDE_SEED", Some("1234")),
                ("STAMPEDE_BASE_URL", Some("http://localhost:9000")),
                ("STAMPEDE_LOG_LEVEL", Some("debug")),
            ],
            || {
                let config = ConfigLoader::new().from_env().unwrap();
                assert_eq!(config.workload.tenants, 9);
                assert_eq!(config.workload.seed, Some(1234));
                assert_eq!(config.target.base_url, "http://localhost:9000");
                assert_eq!(
                    config.logging.level,
                    crate::domains::logging::LogLevel::Debug
                );
            },
        );
    }

    #[test]
    fn test_invalid_env_value() {
        temp_env::with_var("STAMPEDE_ROW_CONCURRENCY", Some("many"), || {
            let err = ConfigLoader::new().from_env().unwrap_err();
            assert!(matches!(err, ConfigError::EnvError(_)));
        });
    }

    #[test]
    fn test_env_override_still_validated() {
        temp_env::with_var("STAMPEDE_ROW_CONCURRENCY", Some("0"), || {
            let err = ConfigLoader::new().from_env().unwrap_err();
            assert!(matches!(err, ConfigError::DomainError { .. }));
        });
    }

    #[test]
    fn test_from_file_with_custom_prefix() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "target:\n  base_url: http://10.0.0.5:8080\nworkload:\n  rows_per_table: 10"
        )
        .unwrap();

        temp_env::with_var("LOADTEST_ROWS_PER_TABLE", Some("25"), || {
            let config = ConfigLoader::with_prefix("LOADTEST")
                .from_file(file.path())
                .unwrap();
            assert_eq!(config.target.base_url, "http://10.0.0.5:8080");
            assert_eq!(config.workload.rows_per_table, 25);
        });
    }

    #[test]
    fn test_missing_file() {
        let err = ConfigLoader::new()
            .load(Some("/definitely/not/here.yaml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileReadError(_)));
    }
}
