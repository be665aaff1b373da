//! CLI error types

use skiff_publish::PublishError;
use skiff_registry::RegistryError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the `skiff` binary
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Could not find skiff.toml in {} or any parent directory", .0.display())]
    ProjectNotFound(PathBuf),

    #[error("No [env.{0}] section in skiff.toml")]
    UnknownEnvironment(String),

    #[error("Invalid project configuration: {0:#}")]
    Project(#[from] anyhow::Error),

    #[error("Failed to load CLI configuration from {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },

    #[error("No API token configured")]
    MissingToken,

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error("Failed to render output: {0}")]
    Output(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Help text printed under the error
    pub fn remediation(&self) -> Option<String> {
        match self {
            CliError::ProjectNotFound(_) => {
                Some("Run from a project directory or pass --project <path>".to_string())
            }
            CliError::MissingToken => Some(
                "Export SKIFF_API_TOKEN or set `api_token` in the skiff config file".to_string(),
            ),
            CliError::Publish(e) => e.remediation(),
            _ => None,
        }
    }
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
