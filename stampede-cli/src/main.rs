use anyhow::{Context, Result};
use clap::Parser;
use stampede_config::{ConfigLoader, LogLevel, StampedeConfig};
use stampede_http::{ClientSettings, Connector, HttpConnector};
use stampede_logging::init_logging_from_config;
use stampede_resilience::ShutdownSignal;
use stampede_workload::{LoadRunner, RunReport};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

mod cli;
use cli::{Cli, Commands, ConfigCommands, RunArgs};

/// Load configuration from file and environment
fn load_config(config_path: Option<&PathBuf>) -> Result<StampedeConfig> {
    let path = match config_path {
        Some(path) if path.exists() => {
            info!("Loading configuration from: {:?}", path);
            Some(path)
        }
        Some(path) => {
            warn!("Configuration file not found: {:?}. Using defaults.", path);
            None
        }
        None => {
            debug!("No configuration file specified. Loading from environment or defaults.");
            None
        }
    };

    ConfigLoader::new()
        .load(path)
        .context("Failed to load configuration")
}

/// Resolve the effective configuration: file, then environment, then flags
fn resolve_config(cli: &Cli, run: &RunArgs) -> Result<StampedeConfig> {
    let mut config = load_config(cli.config.as_ref())?;
    run.apply(&mut config);

    if let Some(level) = &cli.log_level {
        config.logging.level = level
            .parse::<LogLevel>()
            .map_err(|e| anyhow::anyhow!(e))?;
    }

    config
        .validate_all()
        .context("Invalid configuration after applying command line flags")?;
    Ok(config)
}

/// Write the metrics summary as JSON
fn write_summary(report: &RunReport, path: &Path, pretty: bool) -> Result<()> {
    let json = if pretty {
        report.summary.to_json_pretty()
    } else {
        report.summary.to_json()
    }
    .context("Failed to serialize metrics summary")?;

    fs::write(path, json).context(format!("Failed to write metrics to {:?}", path))?;
    Ok(())
}

async fn run_command(config: StampedeConfig) -> Result<()> {
    let settings = ClientSettings::from(&config.http);
    let connector: Arc<dyn Connector> =
        Arc::new(HttpConnector::new(config.target.base_url.clone(), settings)?);

    let shutdown = ShutdownSignal::new();
    let ctrl_c = shutdown.trigger_on_ctrl_c();

    let runner = LoadRunner::new(&config, connector)?.with_shutdown(shutdown);
    info!("Target: {}", config.target.base_url);

    let report = runner.run().await;
    ctrl_c.abort();

    println!("\n{}", report);

    if let Some(path) = &config.output.path {
        write_summary(&report, path, config.output.pretty)?;
        println!("\nMetrics written to {}", path.display());
    }

    if report.interrupted {
        return Err(anyhow::anyhow!("Interrupted before the workload completed"));
    }

    let failed = report.failed_tenants().count();
    if failed > 0 {
        error!("{} of {} tenant(s) failed", failed, report.tenants.len());
        return Err(anyhow::anyhow!(
            "{} of {} tenant(s) failed",
            failed,
            report.tenants.len()
        ));
    }
    Ok(())
}

/// Handle sample configuration generation
fn handle_config_sample(output: Option<&PathBuf>, force: bool) -> Result<()> {
    let sample = StampedeConfig::generate_sample();

    let Some(output) = output else {
        print!("{}", sample);
        return Ok(());
    };

    // Check if file exists and force is not set
    if output.exists() && !force {
        return Err(anyhow::anyhow!(
            "File {:?} already exists. Use --force to overwrite.",
            output
        ));
    }

    fs::write(output, sample).context(format!("Failed to write {:?}", output))?;
    println!("Sample configuration written to {:?}", output);
    println!("Validate with: stampede config validate --config-file {:?}", output);
    Ok(())
}

/// Handle configuration validation
fn handle_config_validate(config_file: &PathBuf) -> Result<()> {
    info!("Validating configuration file: {:?}", config_file);

    // Check if file exists
    if !config_file.exists() {
        return Err(anyhow::anyhow!(
            "Configuration file not found: {:?}",
            config_file
        ));
    }

    match ConfigLoader::new().from_file(config_file) {
        Ok(_config) => {
            println!("Configuration file is valid");
            Ok(())
        }
        Err(e) => {
            println!("Configuration validation failed: {}", e);
            Err(e.into())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Some(Commands::Config { config_cmd }) => {
            stampede_logging::init_simple_tracing(cli.log_level.as_deref().unwrap_or("warn"))?;
            match config_cmd {
                ConfigCommands::Sample { output, force } => {
                    handle_config_sample(output.as_ref(), *force)
                }
                ConfigCommands::Validate { config_file } => handle_config_validate(config_file),
            }
        }
        Some(Commands::Run(run)) => {
            let config = resolve_config(&cli, run)?;
            init_logging_from_config(&config.logging)?;
            run_command(config).await
        }
        None => {
            let config = resolve_config(&cli, &cli.run)?;
            init_logging_from_config(&config.logging)?;
            run_command(config).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stampede_workload::TenantOutcome;
    use std::time::Duration;

    fn empty_report() -> RunReport {
        RunReport {
            summary: Default::default(),
            tenants: vec![TenantOutcome::new(0, "org-0-abcdef")],
            elapsed: Duration::from_millis(1500),
            interrupted: false,
        }
    }

    #[test]
    fn test_write_summary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.json");

        write_summary(&empty_report(), &path, true).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written.trim(), "{}");
    }

    #[test]
    fn test_sample_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stampede.yaml");

        handle_config_sample(Some(&path), false).unwrap();
        assert!(handle_config_sample(Some(&path), false).is_err());
        handle_config_sample(Some(&path), true).unwrap();
        handle_config_validate(&path).unwrap();
    }

    #[test]
    fn test_validate_rejects_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        fs::write(&path, "workload:\n  tenants: 0\n").unwrap();
        assert!(handle_config_validate(&path).is_err());
        assert!(handle_config_validate(&dir.path().join("missing.yaml")).is_err());
    }

    #[test]
    fn test_load_config_reads_file_and_tolerates_missing_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stampede.yaml");
        fs::write(&path, "workload:\n  search_requests: 17\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.workload.search_requests, 17);

        let config = load_config(Some(&dir.path().join("missing.yaml"))).unwrap();
        assert_eq!(config.workload.search_requests, 200);
    }

    #[test]
    fn test_flags_override_and_validate() {
        let cli = Cli::try_parse_from(["stampede", "--tenants", "0"]).unwrap();
        assert!(resolve_config(&cli, &cli.run).is_err());

        let cli = Cli::try_parse_from(["stampede", "--log-level", "nope"]).unwrap();
        assert!(resolve_config(&cli, &cli.run).is_err());

        let cli =
            Cli::try_parse_from(["stampede", "--log-level", "debug", "--row-concurrency", "9"])
                .unwrap();
        let config = resolve_config(&cli, &cli.run).unwrap();
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.workload.row_concurrency, 9);
    }
}
