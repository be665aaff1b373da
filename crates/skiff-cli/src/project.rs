//! Project configuration (`skiff.toml`)
//!
//! Top-level keys describe the default environment. An `[env.<name>]` table
//! overrides inheritable keys and replaces binding tables outright: bindings
//! declared at the top level are never inherited by a named environment.

use crate::error::{CliError, CliResult};
use anyhow::Context;
use serde::Deserialize;
use skiff_types::{
    ArtifactFormat, BuildConfig, DurableObjectBinding, EffectiveConfig, KvNamespace,
    MigrationEntry, R2Bucket, SiteConfig, SubdomainPolicy, UsageModel,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::warn;

/// File name searched for
pub const PROJECT_FILE: &str = "skiff.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Triggers {
    #[serde(default)]
    pub crons: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DurableObjects {
    #[serde(default)]
    pub bindings: Vec<DurableObjectBinding>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UnsafeBindings {
    #[serde(default)]
    pub bindings: Vec<serde_json::Value>,
}

/// Keys allowed both at the top level and inside `[env.<name>]`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnvironmentConfig {
    // Inheritable
    pub name: Option<String>,
    pub account_id: Option<String>,
    pub compatibility_date: Option<String>,
    pub compatibility_flags: Option<Vec<String>>,
    pub usage_model: Option<UsageModel>,
    pub workers_dev: Option<bool>,
    pub route: Option<String>,
    pub routes: Option<Vec<String>>,
    pub triggers: Option<Triggers>,

    // Not inherited
    pub vars: Option<BTreeMap<String, serde_json::Value>>,
    pub kv_namespaces: Option<Vec<KvNamespace>>,
    pub durable_objects: Option<DurableObjects>,
    pub r2_buckets: Option<Vec<R2Bucket>>,
    #[serde(rename = "unsafe")]
    pub unsafe_bindings: Option<UnsafeBindings>,
}

impl EnvironmentConfig {
    fn declared_routes(&self) -> Option<Vec<String>> {
        self.routes
            .clone()
            .or_else(|| self.route.clone().map(|route| vec![route]))
    }

    fn binding_tables(&self) -> Vec<&'static str> {
        let mut tables = Vec::new();
        if self.vars.is_some() {
            tables.push("vars");
        }
        if self.kv_namespaces.is_some() {
            tables.push("kv_namespaces");
        }
        if self.durable_objects.is_some() {
            tables.push("durable_objects");
        }
        if self.r2_buckets.is_some() {
            tables.push("r2_buckets");
        }
        if self.unsafe_bindings.is_some() {
            tables.push("unsafe");
        }
        tables
    }
}

/// Parsed `skiff.toml`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectConfig {
    #[serde(flatten)]
    pub top: EnvironmentConfig,

    // Top level only
    pub main: Option<PathBuf>,
    pub format: Option<ArtifactFormat>,
    #[serde(default)]
    pub legacy_env: bool,
    #[serde(default)]
    pub migrations: Vec<MigrationEntry>,
    pub wasm_modules: Option<BTreeMap<String, String>>,
    pub text_blobs: Option<BTreeMap<String, String>>,
    pub site: Option<SiteConfig>,
    /// Directory of public assets served by the worker
    pub public: Option<PathBuf>,
    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub env: BTreeMap<String, EnvironmentConfig>,

    /// Directory holding the file; relative paths resolve against it
    #[serde(skip)]
    pub root: PathBuf,
}

/// Search `start` and its ancestors for a project file
pub fn find(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(PROJECT_FILE))
        .find(|candidate| candidate.is_file())
}

impl ProjectConfig {
    /// Parse a project file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut project: ProjectConfig = toml::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;

        project.root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(project)
    }

    /// Effective settings for `environment`, or for the top level
    pub fn resolve(&self, environment: Option<&str>) -> CliResult<EffectiveConfig> {
        let top = &self.top;
        let inherited = match environment {
            Some(name) => Some(
                self.env
                    .get(name)
                    .ok_or_else(|| CliError::UnknownEnvironment(name.to_string()))?,
            ),
            None => None,
        };

        // Bindings come from the environment alone once one is selected
        let bindings = match inherited {
            Some(env) => {
                for table in top.binding_tables() {
                    if !env.binding_tables().contains(&table) {
                        warn!(
                            table,
                            environment = environment.unwrap_or_default(),
                            "Top-level binding table is not inherited by environments"
                        );
                    }
                }
                env
            }
            None => top,
        };

        Ok(EffectiveConfig {
            name: inherited
                .and_then(|e| e.name.clone())
                .or_else(|| top.name.clone()),
            account_id: inherited
                .and_then(|e| e.account_id.clone())
                .or_else(|| top.account_id.clone()),
            environment: environment.map(str::to_string),
            legacy_env: self.legacy_env,
            main: self.main.as_ref().map(|main| self.root.join(main)),
            format: self.format,
            compatibility_date: inherited
                .and_then(|e| e.compatibility_date.clone())
                .or_else(|| top.compatibility_date.clone()),
            compatibility_flags: inherited
                .and_then(|e| e.compatibility_flags.clone())
                .or_else(|| top.compatibility_flags.clone())
                .unwrap_or_default(),
            usage_model: inherited
                .and_then(|e| e.usage_model)
                .or(top.usage_model),
            workers_dev: inherited
                .and_then(|e| e.workers_dev)
                .or(top.workers_dev)
                .map(SubdomainPolicy::from)
                .unwrap_or_default(),
            routes: inherited
                .and_then(EnvironmentConfig::declared_routes)
                .or_else(|| top.declared_routes())
                .unwrap_or_default(),
            crons: inherited
                .and_then(|e| e.triggers.clone())
                .or_else(|| top.triggers.clone())
                .unwrap_or_default()
                .crons,
            migrations: self.migrations.clone(),
            kv_namespaces: bindings.kv_namespaces.clone().unwrap_or_default(),
            vars: bindings.vars.clone().unwrap_or_default(),
            wasm_modules: self.wasm_modules.as_ref().map(|m| self.rooted(m)),
            text_blobs: self.text_blobs.as_ref().map(|m| self.rooted(m)),
            durable_objects: bindings
                .durable_objects
                .clone()
                .unwrap_or_default()
                .bindings,
            r2_buckets: bindings.r2_buckets.clone().unwrap_or_default(),
            unsafe_bindings: bindings
                .unsafe_bindings
                .clone()
                .unwrap_or_default()
                .bindings,
            site: self.site.as_ref().map(|site| self.rooted_site(site)),
            public_dir: self.public.as_ref().map(|dir| self.root.join(dir)),
            build: BuildConfig {
                command: self.build.command.clone(),
                cwd: Some(
                    self.build
                        .cwd
                        .as_ref()
                        .map(|cwd| self.root.join(cwd))
                        .unwrap_or_else(|| self.root.clone()),
                ),
            },
        })
    }

    fn rooted_site(&self, site: &SiteConfig) -> SiteConfig {
        let root = |dir: &String| self.root.join(dir).display().to_string();
        SiteConfig {
            bucket: site.bucket.as_ref().map(root),
            entry_point: site.entry_point.as_ref().map(root),
            ..site.clone()
        }
    }

    fn rooted(&self, files: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        files
            .iter()
            .map(|(name, path)| (name.clone(), self.root.join(path).display().to_string()))
            .collect()
    }
}
