// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for bridge-init

use thiserror::Error;

/// Result type alias for bridge-init operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Errors that can occur while bootstrapping the bridge
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Invalid configuration values
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// The persisted context document exists but is not a JSON object
    #[error("Couldn't parse context file {path}: {message}")]
    ContextParse { path: String, message: String },

    /// Secret store lookup or write failed for a reason other than "not found"
    #[error("Secret store error for parameter '{parameter}': {message}")]
    SecretStore { parameter: String, message: String },

    /// The remote account API rejected a request or could not be reached
    #[error("Remote API call '{operation}' failed: {message}")]
    RemoteApi { operation: String, message: String },

    /// The local identity authority rejected a control-plane call
    #[error("Control-plane call '{operation}' failed: {message}")]
    ControlPlane { operation: String, message: String },

    /// IO error wrapper
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl BridgeError {
    pub(crate) fn remote(operation: &str, message: impl Into<String>) -> Self {
        Self::RemoteApi {
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn control_plane(operation: &str, message: impl Into<String>) -> Self {
        Self::ControlPlane {
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn secret_store(parameter: &str, message: impl Into<String>) -> Self {
        Self::SecretStore {
            parameter: parameter.to_string(),
            message: message.into(),
        }
    }
}
