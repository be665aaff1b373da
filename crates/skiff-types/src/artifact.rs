//! Artifact types - the compiled worker and the payload built around it

use crate::bindings::BindingSet;
use crate::ids::ScriptName;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the compiled worker exposes its handlers
///
/// The two formats are mutually exclusive delivery mechanisms: legacy
/// wasm/text bindings only exist for `ServiceWorker`, while `Modules`
/// workers import those resources directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactFormat {
    /// Single script registering event listeners
    ServiceWorker,
    /// ES module set with a default export
    Modules,
}

impl ArtifactFormat {
    /// Module type of the entry point for this format
    pub fn main_module_type(&self) -> ModuleType {
        match self {
            ArtifactFormat::ServiceWorker => ModuleType::CommonJs,
            ArtifactFormat::Modules => ModuleType::Esm,
        }
    }
}

impl fmt::Display for ArtifactFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactFormat::ServiceWorker => f.write_str("service-worker"),
            ArtifactFormat::Modules => f.write_str("modules"),
        }
    }
}

impl std::str::FromStr for ArtifactFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "service-worker" => Ok(ArtifactFormat::ServiceWorker),
            "modules" => Ok(ArtifactFormat::Modules),
            other => Err(format!(
                "unknown format '{}', expected 'modules' or 'service-worker'",
                other
            )),
        }
    }
}

/// Kind of content carried by a module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModuleType {
    Esm,
    CommonJs,
    CompiledWasm,
    Text,
    Data,
}

impl ModuleType {
    /// Content type the registry expects for this module kind
    pub fn content_type(&self) -> &'static str {
        match self {
            ModuleType::Esm => "application/javascript+module",
            ModuleType::CommonJs => "application/javascript",
            ModuleType::CompiledWasm => "application/wasm",
            ModuleType::Text => "text/plain",
            ModuleType::Data => "application/octet-stream",
        }
    }
}

/// One named module of the artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSource {
    pub name: String,
    pub content: Vec<u8>,
    pub module_type: ModuleType,
}

impl ModuleSource {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>, module_type: ModuleType) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            module_type,
        }
    }
}

/// Billing model requested for the script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageModel {
    Bundled,
    Unbound,
}

/// Everything sent to the registry in the single upload call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerUpload {
    pub name: ScriptName,
    pub format: ArtifactFormat,
    pub main: ModuleSource,
    pub modules: Vec<ModuleSource>,
    pub bindings: BindingSet,
    pub compatibility_date: String,
    #[serde(default)]
    pub compatibility_flags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_model: Option<UsageModel>,
}
