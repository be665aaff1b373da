//! Concurrent activation of delivery surfaces
//!
//! Once the upload is live, every enabled surface is written concurrently
//! and all of them are joined. No surface waits for another and no outcome
//! is dropped, so a failure is always attributable to one surface.

use crate::report::summarize_routes;
use futures::future::{join_all, BoxFuture, FutureExt};
use skiff_registry::{RegistryError, ScriptRegistry};
use skiff_types::{DeploymentTarget, ScriptTarget, SubdomainPolicy, TargetKind};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Pause after enabling the subdomain
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(3);

/// Tunables of the activation phase
#[derive(Debug, Clone)]
pub struct ActivationSettings {
    pub settle_delay: Duration,
    pub route_summary_limit: usize,
}

/// Result of activating one surface
#[derive(Debug)]
pub struct TargetOutcome {
    pub kind: TargetKind,
    /// Time from launch until the surface answered
    pub elapsed: Duration,
    /// Report lines for the surface
    pub result: Result<Vec<String>, RegistryError>,
}

/// Surfaces to activate, in launch order
pub fn plan_targets(
    workers_dev: SubdomainPolicy,
    routes: &[String],
    crons: &[String],
) -> Vec<DeploymentTarget> {
    let mut targets = Vec::new();
    if workers_dev == SubdomainPolicy::Enable {
        targets.push(DeploymentTarget::WorkersDevSubdomain);
    }
    if !routes.is_empty() {
        targets.push(DeploymentTarget::CustomRoutes(routes.to_vec()));
    }
    if !crons.is_empty() {
        targets.push(DeploymentTarget::Schedules(crons.to_vec()));
    }
    targets
}

/// Activate every target concurrently and collect all outcomes
pub async fn activate(
    registry: &dyn ScriptRegistry,
    script: &ScriptTarget,
    targets: &[DeploymentTarget],
    available_on_subdomain: bool,
    settings: &ActivationSettings,
) -> Vec<TargetOutcome> {
    let launched: Vec<BoxFuture<'_, TargetOutcome>> = targets
        .iter()
        .map(move |target| {
            let kind = target.kind();
            let work: BoxFuture<'_, Result<Vec<String>, RegistryError>> = match target {
                DeploymentTarget::WorkersDevSubdomain => enable_subdomain(
                    registry,
                    script,
                    available_on_subdomain,
                    settings.settle_delay,
                )
                .map(|url| url.map(|url| vec![url]))
                .boxed(),
                DeploymentTarget::CustomRoutes(patterns) => async move {
                    registry.put_routes(script, patterns).await?;
                    Ok::<_, RegistryError>(summarize_routes(
                        patterns,
                        settings.route_summary_limit,
                    ))
                }
                .boxed(),
                DeploymentTarget::Schedules(crons) => async move {
                    registry.put_schedules(script, crons).await?;
                    Ok::<_, RegistryError>(crons.clone())
                }
                .boxed(),
            };
            async move {
                let started = Instant::now();
                let result = work.await;
                TargetOutcome {
                    kind,
                    elapsed: started.elapsed(),
                    result,
                }
            }
            .boxed()
        })
        .collect();

    debug!(count = launched.len(), "Activating targets");
    join_all(launched).await
}

async fn enable_subdomain(
    registry: &dyn ScriptRegistry,
    script: &ScriptTarget,
    already_enabled: bool,
    settle_delay: Duration,
) -> Result<String, RegistryError> {
    let subdomain = registry.get_subdomain(script.account()).await?;

    if !already_enabled {
        registry.set_subdomain_enabled(script, true).await?;
        // Fresh subdomain bindings take a moment to become reachable.
        tokio::time::sleep(settle_delay).await;
    }

    Ok(format!("https://{}", script.subdomain_host(&subdomain)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use skiff_registry::{InMemoryScriptRegistry, RegistryOp};
    use skiff_types::{AccountId, ScriptName};

    fn script() -> ScriptTarget {
        ScriptTarget::resolve(AccountId::new("acct"), ScriptName::new("api"), None, false)
    }

    fn settings() -> ActivationSettings {
        ActivationSettings {
            settle_delay: DEFAULT_SETTLE_DELAY,
            route_summary_limit: 10,
        }
    }

    fn registry() -> InMemoryScriptRegistry {
        let registry = InMemoryScriptRegistry::new().with_subdomain(AccountId::new("acct"), "team");
        registry.seed_script(script(), None, false);
        registry
    }

    #[test]
    fn test_plan_skips_empty_surfaces() {
        assert!(plan_targets(SubdomainPolicy::Disable, &[], &[]).is_empty());

        let targets = plan_targets(
            SubdomainPolicy::Enable,
            &["example.com/*".to_string()],
            &[],
        );
        assert_eq!(
            targets.iter().map(|t| t.kind()).collect::<Vec<_>>(),
            vec![TargetKind::Subdomain, TargetKind::Routes]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_enable_waits_for_settling() {
        let registry = registry();
        let targets = plan_targets(SubdomainPolicy::Enable, &[], &[]);

        let started = tokio::time::Instant::now();
        let outcomes = activate(&registry, &script(), &targets, false, &settings()).await;

        assert!(started.elapsed() >= DEFAULT_SETTLE_DELAY);
        assert!(outcomes[0].elapsed >= DEFAULT_SETTLE_DELAY);
        assert_eq!(
            outcomes[0].result.as_ref().unwrap(),
            &vec!["https://api.team.workers.dev".to_string()]
        );
        assert!(registry.subdomain_enabled(&script()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_enabled_skips_toggle_and_delay() {
        let registry = registry();
        let targets = plan_targets(SubdomainPolicy::Enable, &[], &[]);

        let started = tokio::time::Instant::now();
        let outcomes = activate(&registry, &script(), &targets, true, &settings()).await;

        assert!(started.elapsed() < DEFAULT_SETTLE_DELAY);
        assert!(outcomes[0].result.is_ok());
        assert_eq!(registry.count(RegistryOp::SetSubdomain).await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_targets_run_concurrently() {
        let registry = registry();
        registry.delay_on(RegistryOp::PutRoutes, Duration::from_secs(2));
        registry.delay_on(RegistryOp::PutSchedules, Duration::from_secs(2));

        let targets = plan_targets(
            SubdomainPolicy::Enable,
            &["example.com/*".to_string()],
            &["0 * * * *".to_string()],
        );

        let started = tokio::time::Instant::now();
        let outcomes = activate(&registry, &script(), &targets, false, &settings()).await;

        // Bounded by the slowest surface, not the sum
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(outcomes.iter().all(|o| o.result.is_ok()));
        assert_eq!(outcomes[1].kind, TargetKind::Routes);
        assert!(outcomes[1].elapsed >= Duration::from_secs(2));
        assert!(outcomes[1].elapsed < DEFAULT_SETTLE_DELAY);
    }

    #[tokio::test]
    async fn test_one_failure_keeps_other_outcomes() {
        let registry = registry();
        registry.fail_on(RegistryOp::PutSchedules, "invalid cron");

        let targets = plan_targets(
            SubdomainPolicy::Disable,
            &["example.com/*".to_string()],
            &["61 * * * *".to_string()],
        );
        let outcomes = activate(&registry, &script(), &targets, false, &settings()).await;

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].result.is_ok());
        assert_eq!(outcomes[1].kind, TargetKind::Schedules);
        assert!(outcomes[1].result.is_err());
    }
}
