//! Skiff Types - Core types for the worker publish pipeline
//!
//! A publish ships one compiled worker plus its declared bindings to the
//! platform's script registry, then activates it on the delivery surfaces
//! the project asks for.
//!
//! ## Key Concepts
//!
//! - **MigrationEntry / MigrationDelta**: Durable-object class history and the
//!   part of it the remote script has not seen yet
//! - **BindingSet**: Every named resource the worker receives at runtime
//! - **EffectiveConfig**: Environment-merged project settings
//! - **ScriptTarget**: Where on the registry a script (or service environment) lives
//! - **DeploymentTarget**: A delivery surface (subdomain, routes, schedules)
//! - **PublishResult**: What a single publish produced

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod artifact;
pub mod bindings;
pub mod config;
pub mod ids;
pub mod migration;
pub mod result;
pub mod target;

// Re-export main types
pub use artifact::{ArtifactFormat, ModuleSource, ModuleType, UsageModel, WorkerUpload};
pub use bindings::{BindingSet, DurableObjectBinding, KvNamespace, R2Bucket};
pub use config::{BuildConfig, EffectiveConfig, SiteConfig, SubdomainPolicy};
pub use ids::{AccountId, ScriptName};
pub use migration::{MigrationDelta, MigrationEntry, MigrationStep, RenamedClass};
pub use result::{PublishResult, SurfaceTiming};
pub use target::{DeploymentTarget, ScriptTarget, TargetKind};
