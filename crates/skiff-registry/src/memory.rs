//! In-memory implementation of the script registry
//!
//! Suitable for development and testing. Every call is appended to a journal
//! so callers can assert exactly which remote operations a publish issued,
//! and any operation can be made to fail or stall.

use crate::error::{RegistryError, Result};
use crate::registry::{ScriptRegistry, ScriptSummary, UploadResponse};
use async_trait::async_trait;
use dashmap::DashMap;
use skiff_types::{AccountId, ScriptTarget, WorkerUpload};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

/// Registry operation, used to inject faults and filter the journal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistryOp {
    ListScripts,
    PutScript,
    GetSubdomain,
    SetSubdomain,
    PutRoutes,
    PutSchedules,
}

/// A recorded registry call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryCall {
    ListScripts { account: String },
    PutScript { path: String },
    GetSubdomain { account: String },
    SetSubdomain { path: String, enabled: bool },
    PutRoutes { path: String, patterns: Vec<String> },
    PutSchedules { path: String, crons: Vec<String> },
}

impl RegistryCall {
    pub fn op(&self) -> RegistryOp {
        match self {
            RegistryCall::ListScripts { .. } => RegistryOp::ListScripts,
            RegistryCall::PutScript { .. } => RegistryOp::PutScript,
            RegistryCall::GetSubdomain { .. } => RegistryOp::GetSubdomain,
            RegistryCall::SetSubdomain { .. } => RegistryOp::SetSubdomain,
            RegistryCall::PutRoutes { .. } => RegistryOp::PutRoutes,
            RegistryCall::PutSchedules { .. } => RegistryOp::PutSchedules,
        }
    }
}

/// Stored state of one script
#[derive(Debug, Clone, Default)]
struct StoredScript {
    upload: Option<WorkerUpload>,
    migration_tag: Option<String>,
    subdomain_enabled: bool,
    routes: Vec<String>,
    schedules: Vec<String>,
}

/// In-memory script registry
pub struct InMemoryScriptRegistry {
    scripts: DashMap<ScriptTarget, StoredScript>,
    subdomains: DashMap<AccountId, String>,
    failures: DashMap<RegistryOp, String>,
    delays: DashMap<RegistryOp, Duration>,
    journal: Mutex<Vec<RegistryCall>>,
}

impl InMemoryScriptRegistry {
    pub fn new() -> Self {
        Self {
            scripts: DashMap::new(),
            subdomains: DashMap::new(),
            failures: DashMap::new(),
            delays: DashMap::new(),
            journal: Mutex::new(Vec::new()),
        }
    }

    /// Register the account subdomain
    pub fn with_subdomain(self, account: AccountId, subdomain: impl Into<String>) -> Self {
        self.subdomains.insert(account, subdomain.into());
        self
    }

    /// Pretend a script was published before
    pub fn seed_script(
        &self,
        target: ScriptTarget,
        migration_tag: Option<&str>,
        subdomain_enabled: bool,
    ) {
        self.scripts.insert(
            target,
            StoredScript {
                migration_tag: migration_tag.map(str::to_string),
                subdomain_enabled,
                ..Default::default()
            },
        );
    }

    /// Make every future call of `op` fail
    pub fn fail_on(&self, op: RegistryOp, reason: impl Into<String>) {
        self.failures.insert(op, reason.into());
    }

    /// Make every future call of `op` take `delay` before answering
    pub fn delay_on(&self, op: RegistryOp, delay: Duration) {
        self.delays.insert(op, delay);
    }

    /// Every call issued so far, in order
    pub async fn calls(&self) -> Vec<RegistryCall> {
        self.journal.lock().await.clone()
    }

    /// Number of calls of one kind
    pub async fn count(&self, op: RegistryOp) -> usize {
        self.journal
            .lock()
            .await
            .iter()
            .filter(|call| call.op() == op)
            .count()
    }

    /// Last upload stored for a target
    pub fn uploaded(&self, target: &ScriptTarget) -> Option<WorkerUpload> {
        self.scripts.get(target).and_then(|s| s.upload.clone())
    }

    pub fn routes(&self, target: &ScriptTarget) -> Vec<String> {
        self.scripts
            .get(target)
            .map(|s| s.routes.clone())
            .unwrap_or_default()
    }

    pub fn schedules(&self, target: &ScriptTarget) -> Vec<String> {
        self.scripts
            .get(target)
            .map(|s| s.schedules.clone())
            .unwrap_or_default()
    }

    pub fn subdomain_enabled(&self, target: &ScriptTarget) -> bool {
        self.scripts
            .get(target)
            .map(|s| s.subdomain_enabled)
            .unwrap_or(false)
    }

    pub fn migration_tag(&self, target: &ScriptTarget) -> Option<String> {
        self.scripts.get(target).and_then(|s| s.migration_tag.clone())
    }

    // --- Internal helpers ---

    async fn record(&self, call: RegistryCall) -> Result<()> {
        let op = call.op();
        debug!(?call, "In-memory registry call");
        self.journal.lock().await.push(call);

        let delay = self.delays.get(&op).map(|d| *d);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match self.failures.get(&op) {
            Some(reason) => Err(RegistryError::Rejected(reason.value().clone())),
            None => Ok(()),
        }
    }

    fn existing(&self, target: &ScriptTarget) -> Result<()> {
        if self.scripts.contains_key(target) {
            Ok(())
        } else {
            Err(RegistryError::ScriptNotFound(target.to_string()))
        }
    }
}

impl Default for InMemoryScriptRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScriptRegistry for InMemoryScriptRegistry {
    async fn list_scripts(&self, account: &AccountId) -> Result<Vec<ScriptSummary>> {
        self.record(RegistryCall::ListScripts {
            account: account.to_string(),
        })
        .await?;

        let mut scripts: Vec<ScriptSummary> = self
            .scripts
            .iter()
            .filter(|entry| entry.key().account() == account)
            .map(|entry| ScriptSummary {
                id: entry.key().script_name().to_string(),
                migration_tag: entry.value().migration_tag.clone(),
            })
            .collect();
        scripts.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(scripts)
    }

    async fn put_script(
        &self,
        target: &ScriptTarget,
        upload: &WorkerUpload,
    ) -> Result<UploadResponse> {
        self.record(RegistryCall::PutScript {
            path: target.path(),
        })
        .await?;

        let mut stored = self.scripts.entry(target.clone()).or_default();
        let available_on_subdomain = stored.subdomain_enabled;
        if let Some(delta) = &upload.bindings.migrations {
            stored.migration_tag = Some(delta.new_tag.clone());
        }
        stored.upload = Some(upload.clone());

        Ok(UploadResponse {
            available_on_subdomain,
        })
    }

    async fn get_subdomain(&self, account: &AccountId) -> Result<String> {
        self.record(RegistryCall::GetSubdomain {
            account: account.to_string(),
        })
        .await?;

        self.subdomains
            .get(account)
            .map(|s| s.clone())
            .ok_or(RegistryError::SubdomainNotRegistered)
    }

    async fn set_subdomain_enabled(&self, target: &ScriptTarget, enabled: bool) -> Result<()> {
        self.record(RegistryCall::SetSubdomain {
            path: target.path(),
            enabled,
        })
        .await?;

        self.existing(target)?;
        if let Some(mut stored) = self.scripts.get_mut(target) {
            stored.subdomain_enabled = enabled;
        }
        Ok(())
    }

    async fn put_routes(&self, target: &ScriptTarget, patterns: &[String]) -> Result<()> {
        self.record(RegistryCall::PutRoutes {
            path: target.path(),
            patterns: patterns.to_vec(),
        })
        .await?;

        self.existing(target)?;
        if let Some(mut stored) = self.scripts.get_mut(target) {
            stored.routes = patterns.to_vec();
        }
        Ok(())
    }

    async fn put_schedules(&self, target: &ScriptTarget, crons: &[String]) -> Result<()> {
        self.record(RegistryCall::PutSchedules {
            path: target.path(),
            crons: crons.to_vec(),
        })
        .await?;

        self.existing(target)?;
        if let Some(mut stored) = self.scripts.get_mut(target) {
            stored.schedules = crons.to_vec();
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}
