//! Effective configuration consumed by the publish pipeline
//!
//! This is the already environment-merged view of the project settings.
//! Loading the file and applying `[env.*]` overlays happens before any of
//! these types are built.

use crate::artifact::{ArtifactFormat, UsageModel};
use crate::bindings::{DurableObjectBinding, KvNamespace, R2Bucket};
use crate::migration::MigrationEntry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Whether the worker should be reachable on the platform subdomain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubdomainPolicy {
    #[default]
    Enable,
    Disable,
}

impl From<bool> for SubdomainPolicy {
    fn from(enabled: bool) -> Self {
        if enabled {
            SubdomainPolicy::Enable
        } else {
            SubdomainPolicy::Disable
        }
    }
}

/// Static site served from a storage namespace
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Directory holding the public files
    #[serde(default)]
    pub bucket: Option<String>,

    /// Old location of the worker entry; no longer read
    #[serde(default, rename = "entry-point")]
    pub entry_point: Option<String>,

    #[serde(default)]
    pub include: Vec<String>,

    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Custom build step run before bundling
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Shell command producing the entry file
    #[serde(default)]
    pub command: Option<String>,

    /// Working directory for the command
    #[serde(default)]
    pub cwd: Option<PathBuf>,
}

/// Environment-merged settings for one publish
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub name: Option<String>,
    pub account_id: Option<String>,

    /// Selected environment, if any
    pub environment: Option<String>,

    /// Publish environments as `<name>-<env>` scripts instead of service environments
    #[serde(default)]
    pub legacy_env: bool,

    /// Entry file of the worker
    pub main: Option<PathBuf>,

    /// Format forced by the user; detected when absent
    pub format: Option<ArtifactFormat>,

    pub compatibility_date: Option<String>,
    #[serde(default)]
    pub compatibility_flags: Vec<String>,
    pub usage_model: Option<UsageModel>,

    #[serde(default)]
    pub workers_dev: SubdomainPolicy,
    #[serde(default)]
    pub routes: Vec<String>,
    #[serde(default)]
    pub crons: Vec<String>,

    #[serde(default)]
    pub migrations: Vec<MigrationEntry>,

    #[serde(default)]
    pub kv_namespaces: Vec<KvNamespace>,
    #[serde(default)]
    pub vars: BTreeMap<String, serde_json::Value>,
    pub wasm_modules: Option<BTreeMap<String, String>>,
    pub text_blobs: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub durable_objects: Vec<DurableObjectBinding>,
    #[serde(default)]
    pub r2_buckets: Vec<R2Bucket>,
    #[serde(default)]
    pub unsafe_bindings: Vec<serde_json::Value>,

    pub site: Option<SiteConfig>,
    /// Directory served as public assets from the worker itself
    pub public_dir: Option<PathBuf>,
    #[serde(default)]
    pub build: BuildConfig,
}

impl EffectiveConfig {
    /// Whether any legacy wasm/text binding table is declared
    pub fn declares_legacy_bindings(&self) -> bool {
        self.wasm_modules.is_some() || self.text_blobs.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subdomain_policy_from_bool() {
        assert_eq!(SubdomainPolicy::from(true), SubdomainPolicy::Enable);
        assert_eq!(SubdomainPolicy::from(false), SubdomainPolicy::Disable);
        assert_eq!(SubdomainPolicy::default(), SubdomainPolicy::Enable);
    }

    #[test]
    fn test_empty_tables_count_as_legacy() {
        let config = EffectiveConfig {
            text_blobs: Some(BTreeMap::new()),
            ..Default::default()
        };
        assert!(config.declares_legacy_bindings());
    }
}
