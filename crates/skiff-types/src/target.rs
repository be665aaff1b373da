//! Registry locations and delivery surfaces

use crate::ids::{AccountId, ScriptName};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Domain under which account subdomains are served
pub const PLATFORM_DOMAIN: &str = "workers.dev";

/// Where a script lives on the registry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScriptTarget {
    /// A plain script, addressed by name
    Script {
        account: AccountId,
        name: ScriptName,
    },

    /// A named environment of a service
    ServiceEnvironment {
        account: AccountId,
        service: ScriptName,
        environment: String,
    },
}

impl ScriptTarget {
    /// Pick the registry location for a script and optional environment
    ///
    /// Legacy environments are separate scripts named `<name>-<env>`;
    /// otherwise a selected environment addresses a service environment.
    pub fn resolve(
        account: AccountId,
        name: ScriptName,
        environment: Option<&str>,
        legacy_env: bool,
    ) -> Self {
        match environment {
            Some(env) if legacy_env => ScriptTarget::Script {
                account,
                name: name.with_env_suffix(env),
            },
            Some(env) => ScriptTarget::ServiceEnvironment {
                account,
                service: name,
                environment: env.to_string(),
            },
            None => ScriptTarget::Script { account, name },
        }
    }

    pub fn account(&self) -> &AccountId {
        match self {
            ScriptTarget::Script { account, .. } => account,
            ScriptTarget::ServiceEnvironment { account, .. } => account,
        }
    }

    /// Script or service name as the registry lists it
    pub fn script_name(&self) -> &ScriptName {
        match self {
            ScriptTarget::Script { name, .. } => name,
            ScriptTarget::ServiceEnvironment { service, .. } => service,
        }
    }

    /// API path of the script resource
    pub fn path(&self) -> String {
        match self {
            ScriptTarget::Script { account, name } => {
                format!("/accounts/{}/workers/scripts/{}", account, name)
            }
            ScriptTarget::ServiceEnvironment {
                account,
                service,
                environment,
            } => format!(
                "/accounts/{}/workers/services/{}/environments/{}",
                account, service, environment
            ),
        }
    }

    /// Host the script answers on for a given account subdomain
    pub fn subdomain_host(&self, subdomain: &str) -> String {
        match self {
            ScriptTarget::Script { name, .. } => {
                format!("{}.{}.{}", name, subdomain, PLATFORM_DOMAIN)
            }
            ScriptTarget::ServiceEnvironment {
                service,
                environment,
                ..
            } => format!("{}.{}.{}.{}", environment, service, subdomain, PLATFORM_DOMAIN),
        }
    }
}

impl fmt::Display for ScriptTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptTarget::Script { name, .. } => write!(f, "{}", name),
            ScriptTarget::ServiceEnvironment {
                service,
                environment,
                ..
            } => write!(f, "{} ({})", service, environment),
        }
    }
}

/// Kind of delivery surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Subdomain,
    Routes,
    Schedules,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::Subdomain => write!(f, "{} subdomain", PLATFORM_DOMAIN),
            TargetKind::Routes => f.write_str("routes"),
            TargetKind::Schedules => f.write_str("schedules"),
        }
    }
}

/// A delivery surface to activate after upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeploymentTarget {
    WorkersDevSubdomain,
    CustomRoutes(Vec<String>),
    Schedules(Vec<String>),
}

impl DeploymentTarget {
    pub fn kind(&self) -> TargetKind {
        match self {
            DeploymentTarget::WorkersDevSubdomain => TargetKind::Subdomain,
            DeploymentTarget::CustomRoutes(_) => TargetKind::Routes,
            DeploymentTarget::Schedules(_) => TargetKind::Schedules,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> AccountId {
        AccountId::new("acct")
    }

    #[test]
    fn test_plain_script_path() {
        let target = ScriptTarget::resolve(account(), ScriptName::new("api"), None, false);
        assert_eq!(target.path(), "/accounts/acct/workers/scripts/api");
        assert_eq!(target.to_string(), "api");
        assert_eq!(target.subdomain_host("team"), "api.team.workers.dev");
    }

    #[test]
    fn test_service_environment_path() {
        let target =
            ScriptTarget::resolve(account(), ScriptName::new("api"), Some("staging"), false);
        assert_eq!(
            target.path(),
            "/accounts/acct/workers/services/api/environments/staging"
        );
        assert_eq!(target.to_string(), "api (staging)");
        assert_eq!(
            target.subdomain_host("team"),
            "staging.api.team.workers.dev"
        );
    }

    #[test]
    fn test_legacy_environment_suffixes_name() {
        let target =
            ScriptTarget::resolve(account(), ScriptName::new("api"), Some("staging"), true);
        assert_eq!(target.path(), "/accounts/acct/workers/scripts/api-staging");
        assert_eq!(target.script_name().as_str(), "api-staging");
    }
}
