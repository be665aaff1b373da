//! Bindings - named resources handed to the running worker

use crate::migration::MigrationDelta;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Binding name under which synchronized static assets are exposed
pub const STATIC_CONTENT_BINDING: &str = "__STATIC_CONTENT";

/// Reserved name of the static-asset manifest blob and module
pub const STATIC_CONTENT_MANIFEST: &str = "__STATIC_CONTENT_MANIFEST";

/// Key-value namespace binding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KvNamespace {
    pub binding: String,
    pub id: String,
}

/// Durable-object namespace binding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurableObjectBinding {
    /// Binding name visible to the worker
    pub name: String,
    /// Exported class implementing the object
    pub class_name: String,
    /// Script exporting the class, when it is not this one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_name: Option<String>,
}

/// Object storage bucket binding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct R2Bucket {
    pub binding: String,
    pub bucket_name: String,
}

/// Every binding category sent with one upload
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BindingSet {
    #[serde(default)]
    pub kv_namespaces: Vec<KvNamespace>,

    /// Plain variables; strings are sent as text, anything else as JSON
    #[serde(default)]
    pub vars: BTreeMap<String, serde_json::Value>,

    /// Legacy wasm bindings: name -> module path
    #[serde(default)]
    pub wasm_modules: BTreeMap<String, String>,

    /// Legacy text bindings: name -> content reference
    #[serde(default)]
    pub text_blobs: BTreeMap<String, String>,

    #[serde(default)]
    pub durable_objects: Vec<DurableObjectBinding>,

    /// Class migrations for the durable objects above
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub migrations: Option<MigrationDelta>,

    #[serde(default)]
    pub r2_buckets: Vec<R2Bucket>,

    /// Raw bindings forwarded untouched
    #[serde(default)]
    pub unsafe_bindings: Vec<serde_json::Value>,
}

impl BindingSet {
    /// First binding name that appears twice within its kind, as `(kind, name)`
    pub fn find_duplicate(&self) -> Option<(&'static str, String)> {
        fn first_repeat<'a>(names: impl Iterator<Item = &'a str>) -> Option<String> {
            let mut seen = HashSet::new();
            names
                .into_iter()
                .find(|name| !seen.insert(*name))
                .map(str::to_string)
        }

        if let Some(name) = first_repeat(self.kv_namespaces.iter().map(|ns| ns.binding.as_str())) {
            return Some(("kv_namespaces", name));
        }
        if let Some(name) = first_repeat(self.durable_objects.iter().map(|d| d.name.as_str())) {
            return Some(("durable_objects", name));
        }
        if let Some(name) = first_repeat(self.r2_buckets.iter().map(|b| b.binding.as_str())) {
            return Some(("r2_buckets", name));
        }
        None
    }
}
