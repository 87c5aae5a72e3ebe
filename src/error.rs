//! Error handling module for the wizard core
//!
//! Provides centralized error handling with proper error types using thiserror.
//! Expected misuse (duplicate names, malformed host ranges) never reaches this
//! module: those paths are silent no-ops. Only genuinely exceptional
//! conditions (files, registry loads, transport) are reported here.

use thiserror::Error;

use crate::provision::ProvisionTransitionError;

/// Main error type for the wizard core
#[derive(Error, Debug)]
pub enum WizardError {
    /// IO errors (content files, config files)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration rejected when building a library component
    #[error("Configuration error: {0}")]
    Config(String),

    /// Registry or repository catalog could not be loaded
    #[error("Registry error: {0}")]
    Registry(String),

    /// Transport-level failure outside the per-item provisioning flow
    #[error("Transport error: {0}")]
    Transport(String),

    /// Provisioning state machine misuse
    #[error(transparent)]
    Provision(#[from] ProvisionTransitionError),

    /// Persisted wizard content could not be read or written
    #[error("Content store error: {0}")]
    ContentStore(String),
}

/// Result type alias for wizard operations
pub type Result<T> = std::result::Result<T, WizardError>;

impl WizardError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a registry error
    pub fn registry(msg: impl Into<String>) -> Self {
        Self::Registry(msg.into())
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a content store error
    pub fn content_store(msg: impl Into<String>) -> Self {
        Self::ContentStore(msg.into())
    }
}
