//! Error types for apk-resign

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found at {0}")]
    NotFound(PathBuf),

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {message}")]
    InvalidValue { field: String, message: String },

    /// Missing required field
    #[error("Missing required configuration field: {0}")]
    MissingField(String),

    /// Artifact does not exist
    #[error("Artifact not found at {0}")]
    ArtifactNotFound(PathBuf),

    /// Artifact extension is neither .apk nor .aab
    #[error("Unsupported artifact type: {0}")]
    UnsupportedArtifact(PathBuf),

    /// A required external tool could not be located
    #[error("Tool not found: {tool}. {hint}")]
    ToolNotFound { tool: String, hint: String },

    /// Selected signer tool cannot handle the requested signing
    #[error("Unsupported combination: {0}")]
    UnsupportedCombination(String),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// IO error
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while launching an external tool.
///
/// A tool that runs and exits non-zero is not an error at this level; callers
/// decide what a non-zero exit means.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The process could not be started
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Shorthand for an invalid value on a named field
    pub fn invalid<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}
