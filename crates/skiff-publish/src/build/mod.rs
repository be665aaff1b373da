//! Build collaborators
//!
//! The orchestrator consumes the artifact and the synchronized static assets
//! through two traits. Bundling proper is out of scope here: the shipped
//! [`PassthroughBundler`] publishes an already-built entry file, optionally
//! produced by a custom build command first.

pub mod assets;
pub mod bundler;

pub use assets::{AssetSynchronizer, NoopAssetSync, SyncedAssets};
pub use bundler::{Bundle, Bundler, PassthroughBundler, CUSTOM_BUILD_TIMEOUT};
