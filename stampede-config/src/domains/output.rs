//! Report output configuration

use crate::error::ConfigResult;
use crate::validation::{validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the aggregated metrics summary goes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Optional file the JSON summary is written to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Pretty-print the JSON summary
    #[serde(default = "crate::domains::utils::default_true")]
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: None,
            pretty: true,
        }
    }
}

impl Validatable for OutputConfig {
    fn validate(&self) -> ConfigResult<()> {
        if let Some(ref path) = self.path {
            validate_required_string(&path.to_string_lossy(), "path", self.domain_name())?;
            if path.is_dir() {
                return Err(self.validation_error(format!(
                    "path {} is a directory",
                    path.display()
                )));
            }
        }
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "output"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_defaults() {
        let config = OutputConfig::default();
        assert!(config.path.is_none());
        assert!(config.pretty);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_output_rejects_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = OutputConfig {
            path: Some(dir.path().to_path_buf()),
            pretty: true,
        };
        assert!(config.validate().is_err());
    }
}
