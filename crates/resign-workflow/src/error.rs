//! Error types for the resigning pipeline

use resign_core::{ConfigError, ToolError};
use resign_package::{ManifestParseError, PackageError};
use resign_signing::SigningError;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Pipeline errors; stage errors pass through unchanged
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Signing(#[from] SigningError),

    #[error(transparent)]
    Package(#[from] PackageError),

    #[error(transparent)]
    Manifest(#[from] ManifestParseError),

    #[error(transparent)]
    Tool(#[from] ToolError),

    /// The keystore could not be fetched
    #[error("Failed to download keystore from {url}: {reason}")]
    KeystoreDownload { url: String, reason: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
