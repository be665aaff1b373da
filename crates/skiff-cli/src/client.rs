//! Registry client construction

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use skiff_registry::{HttpScriptRegistry, ScriptRegistry, DEFAULT_API_ENDPOINT};
use std::sync::Arc;
use tracing::debug;

/// Endpoint from the flag, the config file, or the default, in that order
pub fn resolve_endpoint(flag: Option<&str>, config: &CliConfig) -> String {
    flag.or(config.api_endpoint.as_deref())
        .unwrap_or(DEFAULT_API_ENDPOINT)
        .to_string()
}

/// Connect to the registry with the first token found
pub fn connect(
    endpoint: &str,
    token: Option<&str>,
    config: &CliConfig,
) -> CliResult<Arc<dyn ScriptRegistry>> {
    let token = token
        .or(config.api_token.as_deref())
        .filter(|t| !t.is_empty())
        .ok_or(CliError::MissingToken)?;

    let registry = HttpScriptRegistry::new(endpoint, token)?;
    debug!(endpoint = registry.base_url(), "Registry client ready");
    Ok(Arc::new(registry))
}
