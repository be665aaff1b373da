//! Upload metadata encoding
//!
//! The registry receives an upload as multipart form data: one `metadata`
//! part describing the entry point and every binding, plus one part per
//! module or legacy binding file.

use serde_json::{json, Value};
use skiff_types::bindings::STATIC_CONTENT_MANIFEST;
use skiff_types::{ModuleType, WorkerUpload};

/// A form part whose content must be read from disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    /// Form field name
    pub name: String,
    /// Path of the file to attach
    pub path: String,
    pub module_type: ModuleType,
}

/// Build the `metadata` part of an upload
pub fn upload_metadata(upload: &WorkerUpload) -> Value {
    let bindings = &upload.bindings;
    let mut entries: Vec<Value> = Vec::new();

    for ns in &bindings.kv_namespaces {
        entries.push(json!({
            "name": ns.binding,
            "type": "kv_namespace",
            "namespace_id": ns.id,
        }));
    }

    for object in &bindings.durable_objects {
        let mut entry = json!({
            "name": object.name,
            "type": "durable_object_namespace",
            "class_name": object.class_name,
        });
        if let Some(script_name) = &object.script_name {
            entry["script_name"] = json!(script_name);
        }
        entries.push(entry);
    }

    for (name, value) in &bindings.vars {
        match value {
            Value::String(text) => entries.push(json!({
                "name": name,
                "type": "plain_text",
                "text": text,
            })),
            other => entries.push(json!({
                "name": name,
                "type": "json",
                "json": other,
            })),
        }
    }

    for name in bindings.wasm_modules.keys() {
        entries.push(json!({ "name": name, "type": "wasm_module", "part": name }));
    }

    for name in bindings.text_blobs.keys() {
        entries.push(json!({ "name": name, "type": "text_blob", "part": name }));
    }

    for bucket in &bindings.r2_buckets {
        entries.push(json!({
            "name": bucket.binding,
            "type": "r2_bucket",
            "bucket_name": bucket.bucket_name,
        }));
    }

    entries.extend(bindings.unsafe_bindings.iter().cloned());

    let mut metadata = json!({ "bindings": entries });
    if upload.main.module_type == ModuleType::CommonJs {
        metadata["body_part"] = json!(upload.main.name);
    } else {
        metadata["main_module"] = json!(upload.main.name);
    }
    metadata["compatibility_date"] = json!(upload.compatibility_date);
    if !upload.compatibility_flags.is_empty() {
        metadata["compatibility_flags"] = json!(upload.compatibility_flags);
    }
    if let Some(usage_model) = upload.usage_model {
        metadata["usage_model"] = json!(usage_model);
    }
    if let Some(migrations) = &bindings.migrations {
        metadata["migrations"] = json!(migrations);
    }

    metadata
}

/// Legacy binding files that must be attached next to the modules
///
/// The manifest blob is skipped: its content travels as a module part.
pub fn binding_file_parts(upload: &WorkerUpload) -> Vec<FilePart> {
    let wasm = upload
        .bindings
        .wasm_modules
        .iter()
        .map(|(name, path)| FilePart {
            name: name.clone(),
            path: path.clone(),
            module_type: ModuleType::CompiledWasm,
        });

    let text = upload
        .bindings
        .text_blobs
        .iter()
        .filter(|(name, _)| name.as_str() != STATIC_CONTENT_MANIFEST)
        .map(|(name, path)| FilePart {
            name: name.clone(),
            path: path.clone(),
            module_type: ModuleType::Text,
        });

    wasm.chain(text).collect()
}
