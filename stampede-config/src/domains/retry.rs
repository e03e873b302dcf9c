//! Retry and backoff configuration for fan-out requests

use crate::error::ConfigResult;
use crate::validation::{
    validate_ordered, validate_positive, validate_regex, validate_status_code, Validatable,
};
use serde::{Deserialize, Serialize};

/// Retry budget, backoff window and transient-failure signatures
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per item, including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Lower bound of the jittered backoff window in milliseconds
    #[serde(default = "default_jitter_min_ms")]
    pub jitter_min_ms: u64,

    /// Upper bound of the jittered backoff window in milliseconds
    #[serde(default = "default_jitter_max_ms")]
    pub jitter_max_ms: u64,

    /// HTTP statuses that are always retried
    #[serde(default = "default_retryable_statuses")]
    pub retryable_statuses: Vec<u16>,

    /// Case-insensitive pattern; a 400 whose body matches it is retried
    #[serde(default = "default_retryable_body_pattern")]
    pub retryable_body_pattern: String,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            jitter_min_ms: default_jitter_min_ms(),
            jitter_max_ms: default_jitter_max_ms(),
            retryable_statuses: default_retryable_statuses(),
            retryable_body_pattern: default_retryable_body_pattern(),
        }
    }
}

impl Validatable for RetryConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.max_attempts, "max_attempts", self.domain_name())?;
        validate_ordered(
            self.jitter_min_ms,
            self.jitter_max_ms,
            "jitter_ms",
            self.domain_name(),
        )?;
        for status in &self.retryable_statuses {
            validate_status_code(*status, "retryable_statuses", self.domain_name())?;
        }
        validate_regex(
            &self.retryable_body_pattern,
            "retryable_body_pattern",
            self.domain_name(),
        )?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "retry"
    }
}

fn default_max_attempts() -> u32 {
    4
}

fn default_jitter_min_ms() -> u64 {
    25
}

fn default_jitter_max_ms() -> u64 {
    75
}

fn default_retryable_statuses() -> Vec<u16> {
    vec![409, 425, 429, 500, 502, 503, 504]
}

fn default_retryable_body_pattern() -> String {
    "40P01|deadlock|serializ|timeout|insert failed".to_string()
}
