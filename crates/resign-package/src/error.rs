//! Error types for package operations

use std::path::PathBuf;

use resign_core::ToolError;
use thiserror::Error;

/// Result type alias for package operations
pub type Result<T> = std::result::Result<T, PackageError>;

/// Package-related errors
#[derive(Debug, Error)]
pub enum PackageError {
    /// Entries could not be listed
    #[error("Failed to list entries of {path}: {output}")]
    List { path: PathBuf, output: String },

    /// Signature entries could not be removed
    #[error("Failed to remove signature files from {path}: {output}")]
    Unsign { path: PathBuf, output: String },

    /// The aligner failed
    #[error("Failed to align {path}: {output}")]
    Alignment { path: PathBuf, output: String },

    /// Tool could not be started
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why the manifest could not be read
#[derive(Debug, Error)]
pub enum ManifestParseError {
    /// The package could not be opened as a ZIP archive
    #[error("failed to unzip the package: {0}")]
    Archive(String),

    /// The compiled resource table is unreadable
    #[error("failed to parse resources: {0}")]
    Resources(String),

    /// AndroidManifest.xml could not be decoded
    #[error("failed to parse AndroidManifest.xml: {0}")]
    Manifest(String),
}
