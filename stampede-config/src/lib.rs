//! Domain-driven configuration management for Stampede
//!
//! Configuration is split by functional domain (target, workload, retry,
//! http, logging, output). Each domain carries its own defaults and
//! validation, and every field can be overridden from `STAMPEDE_*`
//! environment variables.

pub mod error;
pub mod loader;
pub mod validation;

// Domain-specific configuration modules
pub mod domains;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use validation::Validatable;

// Re-export domain configurations
pub use domains::{
    http::HttpConfig,
    logging::{LogFormat, LogLevel, LoggingConfig},
    output::OutputConfig,
    retry::RetryConfig,
    target::TargetConfig,
    workload::WorkloadConfig,
    StampedeConfig,
};

// Re-export utilities
pub use domains::utils::serde_duration;
