//! Integration tests for stampede-config

use stampede_config::*;
use std::io::Write;
use std::time::Duration;
use temp_env::{with_vars, with_vars_unset};

#[test]
fn test_default_config_validation() {
    let config = StampedeConfig::default();
    assert!(config.validate_all().is_ok());
}

#[test]
fn test_config_loader_from_env() {
    let vars = vec![
        ("STAMPEDE_HTTP_TIMEOUT", Some("60")),
        ("STAMPEDE_ROWS_PER_TABLE", Some("500")),
        ("STAMPEDE_RETRY_MAX_ATTEMPTS", Some("6")),
        ("STAMPEDE_LOG_FORMAT", Some("json")),
    ];

    with_vars(vars, || {
        let config = ConfigLoader::new().from_env().unwrap();

        assert_eq!(config.http.timeout, Duration::from_secs(60));
        assert_eq!(config.workload.rows_per_table, 500);
        assert_eq!(config.retry.max_attempts, 6);
        assert_eq!(config.logging.format, LogFormat::Json);
    });
}

#[test]
fn test_comprehensive_config() {
    let yaml = r#"
target:
  base_url: "http://load-target:9000/api"

workload:
  tenants: 8
  tables_per_tenant: 1
  rows_per_table: 250
  row_concurrency: 10
  search_requests: 20
  search_concurrency: 4
  seed: 99

retry:
  max_attempts: 3
  jitter_min_ms: 5
  jitter_max_ms: 10
  retryable_statuses: [429, 503]
  retryable_body_pattern: "deadlock"

http:
  timeout: 10
  user_agent: "Stampede Test"

logging:
  level: debug
  format: compact

output:
  path: "/tmp/stampede-metrics.json"
  pretty: false
"#;

    let config: StampedeConfig = serde_yaml::from_str(yaml).unwrap();
    assert!(config.validate_all().is_ok());

    assert_eq!(config.target.base_url, "http://load-target:9000/api");
    assert_eq!(config.workload.tenants, 8);
    assert_eq!(config.workload.seed, Some(99));
    assert_eq!(config.retry.retryable_statuses, vec![429, 503]);
    assert_eq!(config.http.timeout, Duration::from_secs(10));
    assert_eq!(config.logging.level, LogLevel::Debug);
    assert!(!config.output.pretty);
}

#[test]
fn test_file_values_are_overridden_by_env() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "workload:\n  tenants: 4\n  search_requests: 7").unwrap();

    with_vars([("STAMPEDE_TENANTS", Some("12"))], || {
        let config = ConfigLoader::new().from_file(file.path()).unwrap();
        assert_eq!(config.workload.tenants, 12);
        assert_eq!(config.workload.search_requests, 7);
    });
}

#[test]
fn test_invalid_file_values_are_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "retry:\n  jitter_min_ms: 90\n  jitter_max_ms: 10").unwrap();

    with_vars_unset(["STAMPEDE_RETRY_JITTER_MIN_MS", "STAMPEDE_RETRY_JITTER_MAX_MS"], || {
        let result = ConfigLoader::new().from_file(file.path());
        assert!(matches!(result, Err(ConfigError::DomainError { .. })));
    });
}

#[test]
fn test_sample_config_generation() {
    let sample = StampedeConfig::generate_sample();
    assert!(sample.contains("workload:"));
    assert!(sample.contains("retryable_body_pattern"));

    let parsed: StampedeConfig = serde_yaml::from_str(&sample).unwrap();
    assert!(parsed.validate_all().is_ok());
}
