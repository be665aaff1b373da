//! Registry error types

use thiserror::Error;

/// One error entry reported by the platform API
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct ApiMessage {
    pub code: u32,
    pub message: String,
}

/// Registry errors
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API request failed: {}", format_messages(.errors))]
    Api { errors: Vec<ApiMessage> },

    #[error("Unexpected response status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Script not found: {0}")]
    ScriptNotFound(String),

    #[error("Account has no subdomain registered")]
    SubdomainNotRegistered,

    #[error("Failed to encode upload: {0}")]
    Encode(String),

    #[error("Failed to read binding source {path}: {source}")]
    BindingSource {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Registry rejected request: {0}")]
    Rejected(String),
}

fn format_messages(errors: &[ApiMessage]) -> String {
    if errors.is_empty() {
        return "no error details returned".to_string();
    }
    errors
        .iter()
        .map(|e| format!("{} [code: {}]", e.message, e.code))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;
