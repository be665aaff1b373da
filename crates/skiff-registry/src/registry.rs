//! Script registry trait
//!
//! The registry is the only shared mutable state a publish touches and the
//! sole source of truth for what is live. Implementations perform no caching
//! and no retries; each call is one round trip.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use skiff_types::{AccountId, ScriptTarget, WorkerUpload};

/// A script as listed by the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptSummary {
    /// Script name
    pub id: String,

    /// Tag of the last migration the registry applied
    #[serde(default)]
    pub migration_tag: Option<String>,
}

/// Response to an artifact upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Whether the script was already reachable on the account subdomain
    #[serde(default)]
    pub available_on_subdomain: bool,
}

/// Registry of deployed scripts
#[async_trait]
pub trait ScriptRegistry: Send + Sync {
    /// List every script of an account
    async fn list_scripts(&self, account: &AccountId) -> Result<Vec<ScriptSummary>>;

    /// Upload the artifact and bindings, replacing the current version
    async fn put_script(
        &self,
        target: &ScriptTarget,
        upload: &WorkerUpload,
    ) -> Result<UploadResponse>;

    /// Subdomain registered for the account
    async fn get_subdomain(&self, account: &AccountId) -> Result<String>;

    /// Toggle availability on the account subdomain
    async fn set_subdomain_enabled(&self, target: &ScriptTarget, enabled: bool) -> Result<()>;

    /// Replace the full route set of the script
    async fn put_routes(&self, target: &ScriptTarget, patterns: &[String]) -> Result<()>;

    /// Replace the full schedule set of the script
    async fn put_schedules(&self, target: &ScriptTarget, crons: &[String]) -> Result<()>;

    /// Registry name for logging
    fn name(&self) -> &str;
}
