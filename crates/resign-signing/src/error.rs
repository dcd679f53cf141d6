//! Error types for signing operations

use std::path::PathBuf;

use resign_core::{ConfigError, ToolError};
use thiserror::Error;

/// Result type alias for signing operations
pub type Result<T> = std::result::Result<T, SigningError>;

/// Signing-related errors
#[derive(Debug, Error)]
pub enum SigningError {
    /// The keystore could not be listed or did not describe the alias
    #[error("Failed to read keystore {keystore}: {reason}")]
    KeystoreRead { keystore: PathBuf, reason: String },

    /// The keystore's signature algorithm is not `<digest>with<cipher>[and<param>]`
    #[error("Unsupported signature algorithm: '{0}'")]
    UnsupportedAlgorithm(String),

    /// The signing configuration cannot produce a command
    #[error("Invalid signing configuration: {0}")]
    InvalidConfiguration(String),

    /// Signing failed; carries the tool's output
    #[error("Failed to sign {path}: {output}")]
    SignFailed { path: PathBuf, output: String },

    /// Verification failed; carries the tool's output
    #[error("Signature verification failed for {path}: {output}")]
    VerificationFailed { path: PathBuf, output: String },

    /// Configuration error (missing tool, unsupported combination)
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Tool could not be started
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
