//! Core data model shared by the pipeline stages

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Package container type, derived from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactType {
    /// Android application package
    Apk,
    /// Android app bundle
    Aab,
}

impl ArtifactType {
    /// Detect the type from a path's extension (case-insensitive)
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("apk") {
            Some(Self::Apk)
        } else if ext.eq_ignore_ascii_case("aab") {
            Some(Self::Aab)
        } else {
            None
        }
    }

    /// Canonical extension including the leading dot
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Apk => ".apk",
            Self::Aab => ".aab",
        }
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Apk => write!(f, "APK"),
            Self::Aab => write!(f, "AAB"),
        }
    }
}

/// A package file moving through the pipeline.
///
/// Each stage produces a new `Artifact` pointing at a fresh path; the input
/// file is never modified in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    path: PathBuf,
    artifact_type: ArtifactType,
}

impl Artifact {
    /// Create an artifact, rejecting unknown extensions
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let artifact_type = ArtifactType::from_path(&path)
            .ok_or_else(|| ConfigError::UnsupportedArtifact(path.clone()))?;
        Ok(Self {
            path,
            artifact_type,
        })
    }

    /// Same artifact type at another location
    pub fn with_path(&self, path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            artifact_type: self.artifact_type,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn artifact_type(&self) -> ArtifactType {
        self.artifact_type
    }

    /// Extension as it appears on disk (keeps the original casing)
    pub fn extension(&self) -> String {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))
            .unwrap_or_else(|| self.artifact_type.extension().to_string())
    }
}

/// How the output should be aligned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AlignmentMode {
    /// Decide per artifact (AAB: standard, APK: from the manifest)
    #[default]
    #[serde(rename = "automatic", alias = "auto")]
    Auto,
    /// Always align uncompressed native libraries to memory pages
    #[serde(rename = "true", alias = "yes", alias = "page")]
    ForcePageAligned,
    /// Always use plain 4-byte alignment
    #[serde(rename = "false", alias = "no", alias = "standard")]
    ForceStandardAligned,
}

impl FromStr for AlignmentMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "automatic" | "auto" => Ok(Self::Auto),
            "true" | "yes" | "page" => Ok(Self::ForcePageAligned),
            "false" | "no" | "standard" => Ok(Self::ForceStandardAligned),
            other => Err(ConfigError::invalid(
                "alignment.mode",
                format!("unknown value '{other}', expected automatic, true or false"),
            )),
        }
    }
}

impl fmt::Display for AlignmentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "automatic"),
            Self::ForcePageAligned => write!(f, "true"),
            Self::ForceStandardAligned => write!(f, "false"),
        }
    }
}

/// Signing scheme version explicitly enabled on apksigner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignerScheme {
    /// Let the signer decide
    #[default]
    Automatic,
    V2,
    V3,
    V4,
}

impl SignerScheme {
    /// The apksigner flag enabling this scheme, if any
    pub fn enable_flag(&self) -> Option<&'static str> {
        match self {
            Self::Automatic => None,
            Self::V2 => Some("--v2-signing-enabled"),
            Self::V3 => Some("--v3-signing-enabled"),
            Self::V4 => Some("--v4-signing-enabled"),
        }
    }
}

impl FromStr for SignerScheme {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "automatic" | "auto" => Ok(Self::Automatic),
            "v2" => Ok(Self::V2),
            "v3" => Ok(Self::V3),
            "v4" => Ok(Self::V4),
            other => Err(ConfigError::invalid(
                "signing.signer_scheme",
                format!("unknown scheme '{other}', expected automatic, v2, v3 or v4"),
            )),
        }
    }
}

impl fmt::Display for SignerScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Automatic => write!(f, "automatic"),
            Self::V2 => write!(f, "v2"),
            Self::V3 => write!(f, "v3"),
            Self::V4 => write!(f, "v4"),
        }
    }
}

/// Which external signing tool to drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignerTool {
    /// apksigner for APKs when available, jarsigner otherwise
    #[default]
    Automatic,
    Apksigner,
    Jarsigner,
}

impl FromStr for SignerTool {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "automatic" | "auto" => Ok(Self::Automatic),
            "apksigner" => Ok(Self::Apksigner),
            "jarsigner" => Ok(Self::Jarsigner),
            other => Err(ConfigError::invalid(
                "signing.signer_tool",
                format!("unknown signer tool '{other}', expected automatic, apksigner or jarsigner"),
            )),
        }
    }
}

impl fmt::Display for SignerTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Automatic => write!(f, "automatic"),
            Self::Apksigner => write!(f, "apksigner"),
            Self::Jarsigner => write!(f, "jarsigner"),
        }
    }
}

/// Tag selecting the signing material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureType {
    Keystore,
    Certificate,
    Pkcs11,
}

impl FromStr for SignatureType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "keystore" => Ok(Self::Keystore),
            "certificate" | "cert" => Ok(Self::Certificate),
            "pkcs11" => Ok(Self::Pkcs11),
            other => Err(ConfigError::invalid(
                "signing.signature_type",
                format!("unknown signature type '{other}', expected keystore, certificate or pkcs11"),
            )),
        }
    }
}

impl fmt::Display for SignatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keystore => write!(f, "keystore"),
            Self::Certificate => write!(f, "certificate"),
            Self::Pkcs11 => write!(f, "pkcs11"),
        }
    }
}
