//! Configuration types

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::types::{AlignmentMode, SignatureType, SignerScheme, SignerTool};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResignConfig {
    /// Artifacts to resign
    pub inputs: InputsConfig,

    /// Java keystore signing material
    pub keystore: KeystoreConfig,

    /// Raw key + certificate signing material
    pub certificate: CertificateConfig,

    /// Hardware token signing material
    pub pkcs11: Pkcs11Config,

    /// Signer selection
    pub signing: SigningConfig,

    /// Output alignment
    pub alignment: AlignmentConfig,

    /// Output naming
    pub output: OutputConfig,

    /// Export of the produced paths
    pub export: ExportConfig,
}

/// Input artifacts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InputsConfig {
    /// Artifact paths, processed in order
    pub artifacts: Vec<PathBuf>,
}

/// Keystore configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeystoreConfig {
    /// Local path, `file://` URL or http(s) URL of the keystore
    pub url: Option<String>,

    /// Keystore password
    pub password: Option<String>,

    /// Key alias
    pub alias: Option<String>,

    /// Password of the key entry, when it differs from the keystore password
    pub key_password: Option<String>,
}

/// Key + certificate files
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CertificateConfig {
    /// PKCS#8 private key file
    pub key_path: Option<PathBuf>,

    /// X.509 certificate file
    pub cert_path: Option<PathBuf>,
}

/// PKCS#11 token configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Pkcs11Config {
    /// Argument handed to the PKCS#11 provider (usually a config file path)
    pub provider_arg: Option<String>,

    /// Token PIN
    pub pin: Option<String>,
}

/// Signing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SigningConfig {
    /// Signing material; inferred from the other sections when unset
    pub signature_type: Option<SignatureType>,

    /// Which signing tool to use
    pub signer_tool: SignerTool,

    /// Explicitly enabled signature scheme (apksigner only)
    pub signer_scheme: SignerScheme,

    /// Allow signing APKs marked debuggable (apksigner only)
    pub debuggable_permitted: bool,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            signature_type: None,
            signer_tool: SignerTool::Automatic,
            signer_scheme: SignerScheme::Automatic,
            debuggable_permitted: true,
        }
    }
}

/// Alignment configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    /// Page alignment mode
    pub mode: AlignmentMode,
}

/// Output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Base name of the produced file(s), without extension
    pub name: Option<String>,

    /// Directory for produced files; defaults to each input's directory
    pub directory: Option<PathBuf>,
}

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Export through `envman` when it is installed
    pub envman: bool,

    /// File receiving `KEY=value` lines
    pub file: Option<PathBuf>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            envman: true,
            file: None,
        }
    }
}

impl ResignConfig {
    /// The active signature type, explicit or inferred
    pub fn signature_type(&self) -> Option<SignatureType> {
        if let Some(explicit) = self.signing.signature_type {
            return Some(explicit);
        }
        if self.keystore.url.as_deref().is_some_and(|u| !u.is_empty()) {
            Some(SignatureType::Keystore)
        } else if self.certificate.key_path.is_some() && self.certificate.cert_path.is_some() {
            Some(SignatureType::Certificate)
        } else if self.pkcs11.provider_arg.as_deref().is_some_and(|a| !a.is_empty()) {
            Some(SignatureType::Pkcs11)
        } else {
            None
        }
    }
}

/// Split a pipe- or newline-delimited list of artifact paths
pub fn split_artifact_list(raw: &str) -> Vec<PathBuf> {
    raw.split(['|', '\n'])
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .collect()
}
