//! Skiff Publish - ships a worker and activates it
//!
//! A publish runs in five phases: preflight, build, upload, activation and
//! report. The migration resolver and binding assembler decide what goes
//! into the upload; the [`PublishManager`] sequences the side effects.
//!
//! ## Architectural Boundaries
//!
//! - `skiff-registry` owns: every remote call, behind [`ScriptRegistry`](skiff_registry::ScriptRegistry)
//! - `skiff-publish` owns: what to send, in which order, and how outcomes are reported
//! - the CLI owns: configuration loading and every byte written to the terminal
//!
//! ## Usage
//!
//! ```no_run
//! use skiff_publish::{NoopAssetSync, PassthroughBundler, PublishManager};
//! use skiff_registry::InMemoryScriptRegistry;
//! use skiff_types::EffectiveConfig;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = PublishManager::new(
//!     Arc::new(InMemoryScriptRegistry::new()),
//!     Arc::new(PassthroughBundler::new()),
//!     Arc::new(NoopAssetSync),
//! );
//!
//! let config = EffectiveConfig {
//!     name: Some("api".into()),
//!     account_id: Some("acct".into()),
//!     compatibility_date: Some("2022-03-01".into()),
//!     main: Some("dist/index.js".into()),
//!     ..Default::default()
//! };
//! let result = manager.publish(&config).await?;
//! for line in skiff_publish::report::render(&result) {
//!     println!("{}", line);
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod activation;
pub mod bindings;
pub mod build;
pub mod error;
pub mod manager;
pub mod migration;
pub mod preflight;
pub mod report;

// Re-exports
pub use activation::{ActivationSettings, TargetOutcome, DEFAULT_SETTLE_DELAY};
pub use bindings::{assemble, manifest_module};
pub use build::{
    AssetSynchronizer, Bundle, Bundler, NoopAssetSync, PassthroughBundler, SyncedAssets,
};
pub use error::{ActivationError, BuildError, ConfigurationError, ErrorKind, PublishError, Result};
pub use manager::{PublishManager, PublishOptions, PublishOverrides};
pub use migration::{resolve, MigrationPlan, ReconciliationWarning};
pub use preflight::PublishIdentity;
