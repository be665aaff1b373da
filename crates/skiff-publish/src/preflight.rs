//! Preflight validation
//!
//! Everything checked here fails before the first network call.

use crate::error::ConfigurationError;
use skiff_types::{AccountId, ArtifactFormat, EffectiveConfig, ScriptName, ScriptTarget};
use std::path::PathBuf;
use tracing::warn;

/// Identity of the script a publish will write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishIdentity {
    pub target: ScriptTarget,
    pub compatibility_date: String,
    pub entry: PathBuf,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Check that the script can be addressed and that `[site]` is usable
pub fn check_identity(config: &EffectiveConfig) -> Result<PublishIdentity, ConfigurationError> {
    let name = present(&config.name).ok_or(ConfigurationError::MissingName)?;
    let account = present(&config.account_id).ok_or(ConfigurationError::MissingAccountId)?;
    let compatibility_date = present(&config.compatibility_date)
        .ok_or(ConfigurationError::MissingCompatibilityDate)?;

    let entry = match (&config.main, &config.site) {
        (Some(main), _) => main.clone(),
        (None, Some(site)) => site
            .entry_point
            .as_ref()
            .map(|dir| PathBuf::from(dir).join("index.js"))
            .ok_or(ConfigurationError::MissingEntryPoint)?,
        (None, None) => return Err(ConfigurationError::MissingEntryPoint),
    };

    if let Some(site) = &config.site {
        if site.bucket.is_none() {
            return Err(ConfigurationError::SiteWithoutBucket);
        }
        if site.entry_point.is_some() {
            warn!("`site.entry-point` is deprecated; set `main` to the worker's entry file instead");
        }
    }

    Ok(PublishIdentity {
        target: ScriptTarget::resolve(
            AccountId::new(account),
            ScriptName::new(name),
            config.environment.as_deref(),
            config.legacy_env,
        ),
        compatibility_date: compatibility_date.to_string(),
        entry,
    })
}

/// Reject binding declarations the chosen format cannot carry
pub fn check_format(
    format: ArtifactFormat,
    config: &EffectiveConfig,
) -> Result<(), ConfigurationError> {
    match format {
        ArtifactFormat::Modules if config.declares_legacy_bindings() => {
            Err(ConfigurationError::LegacyBindingsWithModules)
        }
        ArtifactFormat::ServiceWorker if config.public_dir.is_some() => {
            Err(ConfigurationError::PublicAssetsWithServiceWorker)
        }
        _ => Ok(()),
    }
}
