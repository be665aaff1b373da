//! Publish Manager - sequences a complete publish
//!
//! Preflight and build run locally and fail before anything remote changes.
//! The upload is the single point after which the new version is live; the
//! delivery surfaces are then activated concurrently and their outcomes
//! folded into one [`PublishResult`].

use crate::activation::{self, ActivationSettings, DEFAULT_SETTLE_DELAY};
use crate::bindings::{assemble, manifest_module};
use crate::build::{AssetSynchronizer, Bundler, SyncedAssets};
use crate::error::{ActivationError, PublishError, Result};
use crate::migration;
use crate::preflight::{check_format, check_identity};
use crate::report::DEFAULT_ROUTE_SUMMARY_LIMIT;
use skiff_registry::ScriptRegistry;
use skiff_types::{
    ArtifactFormat, EffectiveConfig, MigrationDelta, PublishResult, ScriptTarget,
    SubdomainPolicy, SurfaceTiming, TargetKind, WorkerUpload,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Command-line values that take precedence over the project config
#[derive(Debug, Clone, Default)]
pub struct PublishOverrides {
    pub name: Option<String>,
    pub entry: Option<PathBuf>,
    pub format: Option<ArtifactFormat>,
    pub compatibility_date: Option<String>,
    pub compatibility_flags: Option<Vec<String>>,
    pub routes: Option<Vec<String>>,
    pub crons: Option<Vec<String>>,
    pub public_dir: Option<PathBuf>,
    pub workers_dev: Option<SubdomainPolicy>,
}

impl PublishOverrides {
    /// Config with every override applied
    pub fn apply(&self, config: &EffectiveConfig) -> EffectiveConfig {
        let mut config = config.clone();
        if let Some(name) = &self.name {
            config.name = Some(name.clone());
        }
        if let Some(entry) = &self.entry {
            config.main = Some(entry.clone());
        }
        if self.format.is_some() {
            config.format = self.format;
        }
        if let Some(date) = &self.compatibility_date {
            config.compatibility_date = Some(date.clone());
        }
        if let Some(flags) = &self.compatibility_flags {
            config.compatibility_flags = flags.clone();
        }
        if let Some(routes) = &self.routes {
            config.routes = routes.clone();
        }
        if let Some(crons) = &self.crons {
            config.crons = crons.clone();
        }
        if let Some(dir) = &self.public_dir {
            config.public_dir = Some(dir.clone());
        }
        if let Some(policy) = self.workers_dev {
            config.workers_dev = policy;
        }
        config
    }
}

/// Publish options
#[derive(Debug, Clone)]
pub struct PublishOptions {
    /// Pause after enabling the account subdomain
    pub settle_delay: Duration,
    /// Route count above which the report abbreviates the route list
    pub route_summary_limit: usize,
    pub overrides: PublishOverrides,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
            route_summary_limit: DEFAULT_ROUTE_SUMMARY_LIMIT,
            overrides: PublishOverrides::default(),
        }
    }
}

/// Publish Manager orchestrates one publish at a time
pub struct PublishManager {
    registry: Arc<dyn ScriptRegistry>,
    bundler: Arc<dyn Bundler>,
    assets: Arc<dyn AssetSynchronizer>,
    options: PublishOptions,
}

impl PublishManager {
    /// Create a new publish manager with default options
    pub fn new(
        registry: Arc<dyn ScriptRegistry>,
        bundler: Arc<dyn Bundler>,
        assets: Arc<dyn AssetSynchronizer>,
    ) -> Self {
        Self {
            registry,
            bundler,
            assets,
            options: PublishOptions::default(),
        }
    }

    pub fn with_options(mut self, options: PublishOptions) -> Self {
        self.options = options;
        self
    }

    /// Publish the worker described by `config`
    #[instrument(skip(self, config), fields(registry = self.registry.name(), env = config.environment.as_deref()))]
    pub async fn publish(&self, config: &EffectiveConfig) -> Result<PublishResult> {
        let config = self.options.overrides.apply(config);

        // 1. Preflight
        let identity = check_identity(&config)?;
        let target = identity.target;
        self.bundler
            .prepare(&identity.entry, &config.build)
            .await?;
        let format = match config.format {
            Some(format) => format,
            None => self.bundler.detect_format(&identity.entry).await?,
        };
        check_format(format, &config)?;

        // 2. Build
        let bundle = self.bundler.bundle(&identity.entry, format).await?;
        let assets = self.sync_assets(&config).await?;
        debug!(bundler = self.bundler.name(), %format, "Artifact built");

        // 3. Resolve migrations and assemble bindings
        let migrations = self.resolve_migrations(&config, &target).await?;
        let bindings = assemble(&config, format, &assets, migrations)?;

        let mut modules = bundle.modules;
        if let Some(manifest) = &assets.manifest {
            modules.push(manifest_module(manifest)?);
        }

        let upload = WorkerUpload {
            name: target.script_name().clone(),
            format,
            main: bundle.main,
            modules,
            bindings,
            compatibility_date: identity.compatibility_date,
            compatibility_flags: config.compatibility_flags.clone(),
            usage_model: config.usage_model,
        };

        // 4. Upload
        let started = Instant::now();
        let response = self
            .registry
            .put_script(&target, &upload)
            .await
            .map_err(|source| PublishError::Upload {
                script: target.to_string(),
                source,
            })?;

        let mut result = PublishResult::new(target.to_string());
        result.upload_duration_ms = elapsed_ms(started);
        info!(script = %target, upload_ms = result.upload_duration_ms, "Script uploaded");

        // 5. Activate
        self.activate(&config, &target, response.available_on_subdomain, result)
            .await
    }

    // --- Internal helpers ---

    async fn sync_assets(&self, config: &EffectiveConfig) -> Result<SyncedAssets> {
        let Some(site) = &config.site else {
            return Ok(SyncedAssets::default());
        };

        let name = config.name.as_deref().unwrap_or_default().trim();
        let namespace = match &config.environment {
            Some(env) => format!("{}-{}", name, env),
            None => name.to_string(),
        };

        debug!(synchronizer = self.assets.name(), %namespace, "Synchronizing assets");
        Ok(self.assets.sync(&namespace, site).await?)
    }

    async fn resolve_migrations(
        &self,
        config: &EffectiveConfig,
        target: &ScriptTarget,
    ) -> Result<Option<MigrationDelta>> {
        if config.migrations.is_empty() {
            return Ok(None);
        }

        let scripts = self
            .registry
            .list_scripts(target.account())
            .await
            .map_err(|source| PublishError::ScriptListing {
                account: target.account().to_string(),
                source,
            })?;

        let remote_tag = scripts
            .iter()
            .find(|script| script.id == target.script_name().as_str())
            .and_then(|script| script.migration_tag.as_deref());

        Ok(migration::resolve(&config.migrations, remote_tag).map(|plan| {
            if let Some(warning) = &plan.warning {
                warn!(script = %target, "{}", warning);
            }
            debug!(
                old_tag = plan.delta.old_tag.as_deref(),
                new_tag = %plan.delta.new_tag,
                steps = plan.delta.steps.len(),
                noop = plan.delta.is_noop(),
                "Resolved migrations"
            );
            plan.delta
        }))
    }

    async fn activate(
        &self,
        config: &EffectiveConfig,
        target: &ScriptTarget,
        available_on_subdomain: bool,
        mut result: PublishResult,
    ) -> Result<PublishResult> {
        let started = Instant::now();

        if config.workers_dev == SubdomainPolicy::Disable {
            if let Err(source) = self.registry.set_subdomain_enabled(target, false).await {
                result.activation_duration_ms = elapsed_ms(started);
                return Err(ActivationError {
                    failed: TargetKind::Subdomain,
                    source,
                    other_failures: Vec::new(),
                    partial: Box::new(result),
                }
                .into());
            }
            info!(script = %target, "Disabled workers.dev subdomain");
        }

        let targets = activation::plan_targets(config.workers_dev, &config.routes, &config.crons);
        let settings = ActivationSettings {
            settle_delay: self.options.settle_delay,
            route_summary_limit: self.options.route_summary_limit,
        };
        let outcomes = activation::activate(
            self.registry.as_ref(),
            target,
            &targets,
            available_on_subdomain,
            &settings,
        )
        .await;
        result.activation_duration_ms = elapsed_ms(started);

        let mut failures = Vec::new();
        for outcome in outcomes {
            result.surface_timings.push(SurfaceTiming {
                kind: outcome.kind,
                duration_ms: millis(outcome.elapsed),
            });
            match outcome.result {
                Ok(lines) => {
                    info!(
                        script = %target,
                        surface = %outcome.kind,
                        elapsed_ms = millis(outcome.elapsed),
                        "Surface activated"
                    );
                    result.surfaces.push(outcome.kind);
                    result.activated_targets.extend(lines);
                }
                Err(e) => {
                    warn!(script = %target, surface = %outcome.kind, error = %e, "Activation failed");
                    failures.push((outcome.kind, e));
                }
            }
        }

        let mut failures = failures.into_iter();
        match failures.next() {
            None => {
                info!(
                    script = %target,
                    surfaces = result.surfaces.len(),
                    activation_ms = result.activation_duration_ms,
                    "Publish completed"
                );
                Ok(result)
            }
            Some((failed, source)) => Err(ActivationError {
                failed,
                source,
                other_failures: failures.collect(),
                partial: Box::new(result),
            }
            .into()),
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    millis(started.elapsed())
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_take_precedence() {
        let config = EffectiveConfig {
            name: Some("api".into()),
            routes: vec!["old.example.com/*".into()],
            crons: vec!["0 * * * *".into()],
            ..Default::default()
        };
        let overrides = PublishOverrides {
            routes: Some(vec!["new.example.com/*".into()]),
            workers_dev: Some(SubdomainPolicy::Disable),
            ..Default::default()
        };

        let applied = overrides.apply(&config);
        assert_eq!(applied.routes, vec!["new.example.com/*".to_string()]);
        assert_eq!(applied.crons, vec!["0 * * * *".to_string()]);
        assert_eq!(applied.workers_dev, SubdomainPolicy::Disable);
        assert_eq!(applied.name.as_deref(), Some("api"));
    }

    #[test]
    fn test_default_options() {
        let options = PublishOptions::default();
        assert_eq!(options.settle_delay, Duration::from_secs(3));
        assert_eq!(options.route_summary_limit, 10);
    }
}
