//! User-level CLI configuration
//!
//! Read from `<config dir>/skiff/config.toml` unless another path is given.
//! A missing file yields the defaults; flags and environment variables take
//! precedence over every value here.

use crate::error::{CliError, CliResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// CLI configuration file contents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Registry API endpoint
    #[serde(default)]
    pub api_endpoint: Option<String>,

    #[serde(default)]
    pub api_token: Option<String>,

    /// Account used when the project does not name one
    #[serde(default)]
    pub account_id: Option<String>,
}

impl CliConfig {
    /// Default location of the configuration file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("skiff").join("config.toml"))
    }

    /// Load from `path`, or from the default location
    pub fn load(path: Option<&str>) -> CliResult<Self> {
        let path = match path {
            Some(path) => PathBuf::from(path),
            None => match Self::default_path() {
                Some(path) => path,
                None => return Ok(Self::default()),
            },
        };
        Self::load_from(&path)
    }

    fn load_from(path: &Path) -> CliResult<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(CliError::Config {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })
            }
        };

        toml::from_str(&content).map_err(|e| CliError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Copy safe to print
    pub fn redacted(&self) -> Self {
        Self {
            api_token: self.api_token.as_ref().map(|_| "********".to_string()),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = CliConfig::load(path.to_str()).unwrap();
        assert_eq!(config, CliConfig::default());
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "api_endpoint = \"http://localhost:8787\"\napi_token = \"secret\"\n",
        )
        .unwrap();

        let config = CliConfig::load(path.to_str()).unwrap();
        assert_eq!(config.api_endpoint.as_deref(), Some("http://localhost:8787"));
        assert_eq!(config.redacted().api_token.as_deref(), Some("********"));
        assert_eq!(config.account_id, None);
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "api_token = [").unwrap();

        assert!(matches!(
            CliConfig::load(path.to_str()),
            Err(CliError::Config { .. })
        ));
    }
}
