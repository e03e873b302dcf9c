//! HTTP client settings

use stampede_config::HttpConfig;
use std::time::Duration;

/// Settings applied to every tenant's HTTP client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// Per-request timeout
    pub timeout: Duration,

    /// TCP connect timeout
    pub connect_timeout: Duration,

    /// User agent string
    pub user_agent: String,

    /// Idle connections kept per host
    pub max_idle_per_host: usize,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self::from(&HttpConfig::default())
    }
}

impl From<&HttpConfig> for ClientSettings {
    fn from(config: &HttpConfig) -> Self {
        Self {
            timeout: config.timeout,
            connect_timeout: config.connection_timeout,
            user_agent: config.user_agent.clone(),
            max_idle_per_host: config.max_idle_per_host,
        }
    }
}
