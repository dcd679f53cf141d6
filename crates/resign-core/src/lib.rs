//! apk-resign core - shared types, configuration and tool execution
//!
//! This crate holds what every pipeline stage needs: the artifact model, the
//! configuration system, Android SDK / JDK tool discovery and the
//! [`CommandRunner`] abstraction through which external tools are invoked.

pub mod config;
pub mod error;
pub mod exec;
pub mod sdk;
pub mod types;

pub use error::{ConfigError, ToolError};
pub use exec::{CommandRunner, ProcessRunner, ToolCommand, ToolOutput};
pub use sdk::{find_jdk_tool, AndroidSdk, ToolPaths};
pub use types::{
    AlignmentMode, Artifact, ArtifactType, SignatureType, SignerScheme, SignerTool,
};
