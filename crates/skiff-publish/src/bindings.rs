//! Binding assembly
//!
//! Merges the configured bindings with the results of asset synchronization
//! and the resolved migrations into the set sent with an upload. Pure: no
//! I/O and no logging.

use crate::build::SyncedAssets;
use crate::error::{BuildError, ConfigurationError};
use crate::preflight::check_format;
use skiff_types::bindings::{STATIC_CONTENT_BINDING, STATIC_CONTENT_MANIFEST};
use skiff_types::{
    ArtifactFormat, BindingSet, EffectiveConfig, KvNamespace, MigrationDelta, ModuleSource,
    ModuleType,
};
use std::collections::BTreeMap;

/// Build the binding set for an upload
pub fn assemble(
    config: &EffectiveConfig,
    format: ArtifactFormat,
    assets: &SyncedAssets,
    migrations: Option<MigrationDelta>,
) -> Result<BindingSet, ConfigurationError> {
    check_format(format, config)?;

    let mut kv_namespaces = config.kv_namespaces.clone();
    if let Some(id) = &assets.namespace_id {
        kv_namespaces.push(KvNamespace {
            binding: STATIC_CONTENT_BINDING.to_string(),
            id: id.clone(),
        });
    }

    let mut text_blobs = config.text_blobs.clone().unwrap_or_default();
    // Modules workers import the manifest module instead.
    if format == ArtifactFormat::ServiceWorker && assets.manifest.is_some() {
        text_blobs.insert(
            STATIC_CONTENT_MANIFEST.to_string(),
            STATIC_CONTENT_MANIFEST.to_string(),
        );
    }

    let bindings = BindingSet {
        kv_namespaces,
        vars: config.vars.clone(),
        wasm_modules: config.wasm_modules.clone().unwrap_or_default(),
        text_blobs,
        durable_objects: config.durable_objects.clone(),
        migrations,
        r2_buckets: config.r2_buckets.clone(),
        unsafe_bindings: config.unsafe_bindings.clone(),
    };

    if let Some((kind, name)) = bindings.find_duplicate() {
        return Err(ConfigurationError::DuplicateBinding { kind, name });
    }
    Ok(bindings)
}

/// Text module carrying the asset manifest as JSON
pub fn manifest_module(manifest: &BTreeMap<String, String>) -> Result<ModuleSource, BuildError> {
    Ok(ModuleSource::new(
        STATIC_CONTENT_MANIFEST,
        serde_json::to_vec(manifest)?,
        ModuleType::Text,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use skiff_types::{DurableObjectBinding, R2Bucket};

    fn config() -> EffectiveConfig {
        EffectiveConfig {
            name: Some("api".into()),
            kv_namespaces: vec![KvNamespace {
                binding: "CACHE".into(),
                id: "ns1".into(),
            }],
            durable_objects: vec![DurableObjectBinding {
                name: "ROOMS".into(),
                class_name: "Room".into(),
                script_name: None,
            }],
            r2_buckets: vec![R2Bucket {
                binding: "FILES".into(),
                bucket_name: "files".into(),
            }],
            ..Default::default()
        }
    }

    fn synced() -> SyncedAssets {
        let mut manifest = BTreeMap::new();
        manifest.insert("index.html".to_string(), "index.abc123.html".to_string());
        SyncedAssets {
            namespace_id: Some("assets-ns".into()),
            manifest: Some(manifest),
        }
    }

    #[test]
    fn test_configured_bindings_pass_through() {
        let delta = MigrationDelta {
            old_tag: None,
            new_tag: "v1".into(),
            steps: vec![],
        };
        let set = assemble(
            &config(),
            ArtifactFormat::Modules,
            &SyncedAssets::default(),
            Some(delta.clone()),
        )
        .unwrap();

        assert_eq!(set.kv_namespaces.len(), 1);
        assert_eq!(set.durable_objects.len(), 1);
        assert_eq!(set.r2_buckets.len(), 1);
        assert_eq!(set.migrations, Some(delta));
        assert!(set.text_blobs.is_empty());
    }

    #[test]
    fn test_synced_assets_add_static_namespace() {
        let set = assemble(&config(), ArtifactFormat::Modules, &synced(), None).unwrap();
        let last = set.kv_namespaces.last().unwrap();
        assert_eq!(last.binding, STATIC_CONTENT_BINDING);
        assert_eq!(last.id, "assets-ns");
        // Modules workers get the manifest as a module, not a blob
        assert!(set.text_blobs.is_empty());
    }

    #[test]
    fn test_service_worker_gets_manifest_blob() {
        let set = assemble(&config(), ArtifactFormat::ServiceWorker, &synced(), None).unwrap();
        assert_eq!(
            set.text_blobs.get(STATIC_CONTENT_MANIFEST).map(String::as_str),
            Some(STATIC_CONTENT_MANIFEST)
        );
    }

    #[test]
    fn test_legacy_blobs_rejected_for_modules() {
        let mut c = config();
        let mut blobs = BTreeMap::new();
        blobs.insert("TEMPLATE".to_string(), "./template.html".to_string());
        c.text_blobs = Some(blobs);

        let err = assemble(&c, ArtifactFormat::Modules, &SyncedAssets::default(), None)
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::LegacyBindingsWithModules));
    }

    #[test]
    fn test_static_namespace_collision() {
        let mut c = config();
        c.kv_namespaces.push(KvNamespace {
            binding: STATIC_CONTENT_BINDING.into(),
            id: "mine".into(),
        });

        let err = assemble(&c, ArtifactFormat::Modules, &synced(), None).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::DuplicateBinding { kind: "kv_namespaces", .. }
        ));
    }

    #[test]
    fn test_manifest_module_is_json_text() {
        let module = manifest_module(synced().manifest.as_ref().unwrap()).unwrap();
        assert_eq!(module.name, STATIC_CONTENT_MANIFEST);
        assert_eq!(module.module_type, ModuleType::Text);
        assert_eq!(
            String::from_utf8(module.content).unwrap(),
            r#"{"index.html":"index.abc123.html"}"#
        );
    }
}
