//! Skiff Registry - access to the platform's script registry
//!
//! The publish pipeline only talks to the registry through the
//! [`ScriptRegistry`] trait. Two implementations ship here:
//!
//! - **HttpScriptRegistry**: the platform REST API over `reqwest`
//! - **InMemoryScriptRegistry**: a process-local registry that journals every
//!   call and can be told to fail specific operations, for development and tests

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod error;
pub mod http;
pub mod memory;
pub mod metadata;
pub mod registry;

// Re-exports
pub use error::{RegistryError, Result};
pub use http::{HttpScriptRegistry, DEFAULT_API_ENDPOINT};
pub use memory::{InMemoryScriptRegistry, RegistryCall, RegistryOp};
pub use registry::{ScriptRegistry, ScriptSummary, UploadResponse};
