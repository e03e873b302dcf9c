//! CLI argument parsing definitions

use clap::{Args, Parser, Subcommand};
use stampede_config::StampedeConfig;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Run flags used when no subcommand is given
    #[command(flatten)]
    pub run: RunArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the load test (default)
    Run(RunArgs),

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        config_cmd: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print or write a sample configuration file
    Sample {
        /// Output file path; prints to stdout when omitted
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },

    /// Validate a configuration file
    Validate {
        /// Path to the configuration file
        #[arg(long, value_name = "PATH")]
        config_file: PathBuf,
    },
}

/// Workload flags; each one overrides the file and environment value
#[derive(Args, Debug, Default, Clone)]
pub struct RunArgs {
    /// Server base URL
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Number of synthetic tenants
    #[arg(long, value_name = "N", visible_alias = "users")]
    pub tenants: Option<usize>,

    /// Tables created by each tenant
    #[arg(long, value_name = "N", visible_alias = "tables-per-user")]
    pub tables_per_tenant: Option<usize>,

    /// Rows inserted into each table
    #[arg(long, value_name = "N")]
    pub rows_per_table: Option<usize>,

    /// Concurrent row insertions per table
    #[arg(long, value_name = "N")]
    pub row_concurrency: Option<usize>,

    /// Number of search requests per table
    #[arg(long, value_name = "N")]
    pub search_requests: Option<usize>,

    /// Concurrent search requests per table
    #[arg(long, value_name = "N")]
    pub search_concurrency: Option<usize>,

    /// Seed for reproducible payloads and backoff
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Path to write the aggregated metrics as JSON
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

impl RunArgs {
    pub fn apply(&self, config: &mut StampedeConfig) {
        if let Some(base_url) = &self.base_url {
            config.target.base_url = base_url.clone();
        }

        let workload = &mut config.workload;
        if let Some(tenants) = self.tenants {
            workload.tenants = tenants;
        }
        if let Some(tables) = self.tables_per_tenant {
            workload.tables_per_tenant = tables;
        }
        if let Some(rows) = self.rows_per_table {
            workload.rows_per_table = rows;
        }
        if let Some(concurrency) = self.row_concurrency {
            workload.row_concurrency = concurrency;
        }
        if let Some(requests) = self.search_requests {
            workload.search_requests = requests;
        }
        if let Some(concurrency) = self.search_concurrency {
            workload.search_concurrency = concurrency;
        }
        if self.seed.is_some() {
            workload.seed = self.seed;
        }

        if let Some(output) = &self.output {
            config.output.path = Some(output.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_takes_run_flags() {
        let cli = Cli::try_parse_from([
            "stampede",
            "--base-url",
            "http://localhost:9000",
            "--users",
            "5",
            "--rows-per-table",
            "100",
            "--seed",
            "7",
        ])
        .unwrap();

        assert!(cli.command.is_none());
        assert_eq!(cli.run.tenants, Some(5));

        let mut config = StampedeConfig::default();
        cli.run.apply(&mut config);
        assert_eq!(config.target.base_url, "http://localhost:9000");
        assert_eq!(config.workload.tenants, 5);
        assert_eq!(config.workload.rows_per_table, 100);
        assert_eq!(config.workload.seed, Some(7));
        // Untouched values keep their defaults
        assert_eq!(config.workload.tables_per_tenant, 2);
        assert_eq!(config.workload.search_concurrency, 50);
    }

    #[test]
    fn test_run_subcommand() {
        let cli = Cli::try_parse_from([
            "stampede",
            "--log-level",
            "debug",
            "run",
            "--tenants",
            "2",
            "--output",
            "metrics.json",
        ])
        .unwrap();

        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        match cli.command {
            Some(Commands::Run(args)) => {
                let mut config = StampedeConfig::default();
                args.apply(&mut config);
                assert_eq!(config.workload.tenants, 2);
                assert_eq!(config.output.path, Some(PathBuf::from("metrics.json")));
            }
            other => panic!("expected run, got {:?}", other),
        }
    }

    #[test]
    fn test_config_subcommands() {
        let cli = Cli::try_parse_from(["stampede", "config", "sample", "--force"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                config_cmd: ConfigCommands::Sample {
                    output: None,
                    force: true
                }
            })
        ));

        let cli = Cli::try_parse_from([
            "stampede",
            "config",
            "validate",
            "--config-file",
            "stampede.yaml",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                config_cmd: ConfigCommands::Validate { .. }
            })
        ));
    }

    #[test]
    fn test_rejects_non_numeric_counts() {
        assert!(Cli::try_parse_from(["stampede", "--tenants", "many"]).is_err());
    }
}
