//! Error types for Strata.
//!
//! All errors use `thiserror` for ergonomic error handling and proper error chains.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Strata operations.
pub type Result<T> = std::result::Result<T, StrataError>;

/// Main error type for Strata.
#[derive(Error, Debug)]
pub enum StrataError {
    // Manifest errors
    #[error("Manifest parse error: {reason}")]
    ManifestParseError { reason: String },

    #[error("Unsupported manifest version: {version}")]
    UnsupportedManifestVersion { version: String },

    #[error("Stack '{stack}' is missing required section '{section}'")]
    MissingSection { stack: String, section: String },

    #[error("Stack '{stack}' references unknown compute stack '{compute}'")]
    UnknownComputeStack { stack: String, compute: String },

    #[error("Service '{service}' references unknown container '{container}'")]
    UnknownContainer { service: String, container: String },

    #[error("Service '{service}' references capacity provider '{provider}' which is not declared")]
    UnknownCapacityProvider { service: String, provider: String },

    #[error("Service '{service}' requests discovery but the compute stack declares no namespace")]
    MissingNamespace { service: String },

    #[error("File read error: {path}: {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // Target errors
    #[error("Unknown deployment target: {target}")]
    UnknownTarget { target: String },

    #[error("No deployment target selected and no default configured")]
    NoTarget,

    // Synthesis errors
    #[error("Duplicate logical id '{logical_id}' in stack '{stack}'")]
    DuplicateLogicalId { stack: String, logical_id: String },

    #[error("Duplicate stack: {name}")]
    DuplicateStack { name: String },

    #[error("Template serialization failed: {reason}")]
    TemplateSerialization { reason: String },

    // Configuration errors
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("I/O error at {path:?}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StrataError {
    /// Create an Internal error from any error type.
    pub fn internal(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Internal(err.to_string())
    }
}
