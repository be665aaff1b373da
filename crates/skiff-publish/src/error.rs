//! Publish error types
//!
//! Every failure a publish can end in belongs to one of four kinds, ordered
//! by how far the pipeline got. Only the top level turns these into
//! user-facing text, using [`PublishError::remediation`] for the hint line.

use skiff_registry::RegistryError;
use skiff_types::{PublishResult, TargetKind};
use std::path::PathBuf;
use thiserror::Error;

/// Invalid or incomplete settings, detected before any network call
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Missing script name")]
    MissingName,

    #[error("Missing account id")]
    MissingAccountId,

    #[error("A compatibility date is required when publishing")]
    MissingCompatibilityDate,

    #[error("Missing entry point")]
    MissingEntryPoint,

    #[error("`wasm_modules` and `text_blobs` are only supported by the service-worker format")]
    LegacyBindingsWithModules,

    #[error("Serving public assets is only supported by the modules format")]
    PublicAssetsWithServiceWorker,

    #[error("A [site] definition requires a `bucket` field with a path to the site's public directory")]
    SiteWithoutBucket,

    #[error("Binding name {name} is declared more than once in {kind}")]
    DuplicateBinding { kind: &'static str, name: String },
}

/// Failure to produce the artifact or synchronize assets
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Failed to run custom build `{command}`: {source}")]
    CommandSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Custom build `{command}` exited with status {status}")]
    CommandFailed { command: String, status: i32 },

    #[error("Custom build `{command}` timed out after {seconds}s")]
    CommandTimedOut { command: String, seconds: u64 },

    #[error("Could not resolve \"{}\" after running custom build", .0.display())]
    UnresolvedEntry(PathBuf),

    #[error("Failed to read {}: {source}", .path.display())]
    ReadEntry {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode asset manifest: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("Asset synchronization failed: {0}")]
    AssetSync(String),
}

/// Activation failed for at least one surface after the upload went live
#[derive(Debug, Error)]
#[error("Failed to activate {failed} for {}: {source}", .partial.script)]
pub struct ActivationError {
    /// First surface that failed, in launch order
    pub failed: TargetKind,

    #[source]
    pub source: RegistryError,

    /// Further surfaces that failed in the same activation
    pub other_failures: Vec<(TargetKind, RegistryError)>,

    /// Timings and the surfaces that did go live
    pub partial: Box<PublishResult>,
}

impl ActivationError {
    /// Every surface that failed
    pub fn failed_targets(&self) -> Vec<TargetKind> {
        std::iter::once(self.failed)
            .chain(self.other_failures.iter().map(|(kind, _)| *kind))
            .collect()
    }
}

/// Publish errors
#[derive(Debug, Error)]
pub enum PublishError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("Failed to look up scripts for {account}: {source}")]
    ScriptListing {
        account: String,
        #[source]
        source: RegistryError,
    },

    #[error("Failed to upload {script}: {source}")]
    Upload {
        script: String,
        #[source]
        source: RegistryError,
    },

    #[error(transparent)]
    Activation(#[from] ActivationError),
}

/// Coarse classification of a publish failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Build,
    Upload,
    Activation,
}

impl PublishError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PublishError::Configuration(_) => ErrorKind::Configuration,
            PublishError::Build(_) => ErrorKind::Build,
            PublishError::ScriptListing { .. } | PublishError::Upload { .. } => ErrorKind::Upload,
            PublishError::Activation(_) => ErrorKind::Activation,
        }
    }

    /// Whether the new version of the script is live despite the error
    pub fn artifact_live(&self) -> bool {
        self.kind() == ErrorKind::Activation
    }

    /// Partial result of a failed activation
    pub fn partial_result(&self) -> Option<&PublishResult> {
        match self {
            PublishError::Activation(e) => Some(&e.partial),
            _ => None,
        }
    }

    /// Help text telling the user what to do next
    pub fn remediation(&self) -> Option<String> {
        match self {
            PublishError::Configuration(e) => configuration_remediation(e),
            PublishError::Build(BuildError::UnresolvedEntry(_)) => Some(
                "Check that `build.command` writes the file named by `main`".to_string(),
            ),
            PublishError::Build(_) => None,
            PublishError::ScriptListing { .. } | PublishError::Upload { .. } => Some(
                "Nothing was changed; the previously published version is still live".to_string(),
            ),
            PublishError::Activation(e) => {
                let failed = e
                    .failed_targets()
                    .iter()
                    .map(|kind| kind.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                let mut hint = format!(
                    "The new version of {} is live; publish again to retry {}",
                    e.partial.script, failed
                );
                if matches!(e.source, RegistryError::SubdomainNotRegistered) {
                    hint.push_str(". Register a workers.dev subdomain for the account first");
                }
                Some(hint)
            }
        }
    }
}

fn configuration_remediation(error: &ConfigurationError) -> Option<String> {
    let hint = match error {
        ConfigurationError::MissingName => {
            "Set `name` in skiff.toml or pass --name".to_string()
        }
        ConfigurationError::MissingAccountId => {
            "Set `account_id` in skiff.toml or export SKIFF_ACCOUNT_ID".to_string()
        }
        ConfigurationError::MissingCompatibilityDate => {
            let today = chrono::Utc::now().format("%Y-%m-%d");
            format!(
                "Add `compatibility_date = \"{}\"` to skiff.toml or pass --compatibility-date {}",
                today, today
            )
        }
        ConfigurationError::MissingEntryPoint => {
            "Set `main` in skiff.toml or pass the entry point as an argument".to_string()
        }
        ConfigurationError::LegacyBindingsWithModules => {
            "Import wasm and text files as modules from the entry point instead".to_string()
        }
        ConfigurationError::PublicAssetsWithServiceWorker => {
            "Export a default handler to switch to the modules format, or use [site]".to_string()
        }
        ConfigurationError::SiteWithoutBucket => {
            "Add `bucket = \"./public\"` to the [site] table".to_string()
        }
        ConfigurationError::DuplicateBinding { .. } => return None,
    };
    Some(hint)
}

/// Result type for publish operations
pub type Result<T> = std::result::Result<T, PublishError>;
