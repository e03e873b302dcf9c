//! Logging infrastructure for Stampede
//!
//! Installs a global `tracing` subscriber from [`LoggingConfig`]. Crates that
//! log through the `log` facade are picked up by the subscriber's log bridge.

pub mod init;

pub use init::{init_logging_from_config, init_simple_tracing};
pub use stampede_config::{LogFormat, LogLevel, LoggingConfig};
