//! Static asset synchronization

use crate::error::BuildError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use skiff_types::SiteConfig;
use std::collections::BTreeMap;

/// Result of uploading static assets
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SyncedAssets {
    /// Namespace holding the uploaded files
    pub namespace_id: Option<String>,

    /// Asset path to content-hashed key
    pub manifest: Option<BTreeMap<String, String>>,
}

/// Uploads a site's static files to a key-value namespace
#[async_trait]
pub trait AssetSynchronizer: Send + Sync {
    /// Upload changed files of `site` into the namespace called `namespace`
    async fn sync(&self, namespace: &str, site: &SiteConfig) -> Result<SyncedAssets, BuildError>;

    /// Synchronizer name for logging
    fn name(&self) -> &str;
}

/// Synchronizer that uploads nothing
pub struct NoopAssetSync;

#[async_trait]
impl AssetSynchronizer for NoopAssetSync {
    async fn sync(&self, _namespace: &str, _site: &SiteConfig) -> Result<SyncedAssets, BuildError> {
        Ok(SyncedAssets::default())
    }

    fn name(&self) -> &str {
        "noop"
    }
}
