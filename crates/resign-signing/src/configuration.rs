//! Signing configuration
//!
//! [`SigningMaterial`] is the closed set of ways a package can be signed.
//! Each variant knows how to render its apksigner arguments through
//! [`MaterialArgs`]; [`SignatureConfiguration`] adds the orthogonal signer
//! scheme and debuggable switches.

use std::path::PathBuf;

use resign_core::config::ResignConfig;
use resign_core::{SignatureType, SignerScheme};

use crate::error::{Result, SigningError};
use crate::keystore::KeystoreDescriptor;

/// PKCS#11 provider class loaded by the signer
pub const PKCS11_PROVIDER_CLASS: &str = "sun.security.pkcs11.SunPKCS11";

/// Keystore type passed for PKCS#11 tokens
pub const PKCS11_KEYSTORE_TYPE: &str = "PKCS11";

/// Keystore location sentinel for PKCS#11 tokens
pub const PKCS11_KEYSTORE: &str = "NONE";

/// Renders the signer arguments for one kind of signing material
pub trait MaterialArgs {
    /// apksigner arguments selecting this key
    fn apksigner_args(&self) -> Result<Vec<String>>;
}

impl MaterialArgs for KeystoreDescriptor {
    fn apksigner_args(&self) -> Result<Vec<String>> {
        if self.path().as_os_str().is_empty() || self.alias().is_empty() {
            return Err(SigningError::InvalidConfiguration(
                "keystore path and alias are required".to_string(),
            ));
        }

        let mut args = vec![
            "--ks".to_string(),
            self.path().to_string_lossy().to_string(),
            "--ks-pass".to_string(),
            format!("pass:{}", self.password()),
            "--ks-key-alias".to_string(),
            self.alias().to_string(),
        ];
        if let Some(key_password) = self.key_password() {
            args.push("--key-pass".to_string());
            args.push(format!("pass:{key_password}"));
        }
        Ok(args)
    }
}

/// A private key file and its certificate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateMaterial {
    pub key_path: PathBuf,
    pub cert_path: PathBuf,
}

impl MaterialArgs for CertificateMaterial {
    fn apksigner_args(&self) -> Result<Vec<String>> {
        if self.key_path.as_os_str().is_empty() || self.cert_path.as_os_str().is_empty() {
            return Err(SigningError::InvalidConfiguration(
                "certificate signing needs both a key and a certificate file".to_string(),
            ));
        }
        Ok(vec![
            "--key".to_string(),
            self.key_path.to_string_lossy().to_string(),
            "--cert".to_string(),
            self.cert_path.to_string_lossy().to_string(),
        ])
    }
}

/// A key held by a PKCS#11 token
#[derive(Clone, PartialEq, Eq)]
pub struct Pkcs11Material {
    pub provider_arg: String,
    pub pin: Option<String>,
}

impl std::fmt::Debug for Pkcs11Material {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pkcs11Material")
            .field("provider_arg", &self.provider_arg)
            .finish_non_exhaustive()
    }
}

impl MaterialArgs for Pkcs11Material {
    fn apksigner_args(&self) -> Result<Vec<String>> {
        if self.provider_arg.is_empty() {
            return Err(SigningError::InvalidConfiguration(
                "PKCS#11 signing needs a provider argument".to_string(),
            ));
        }
        let mut args = vec![
            "--provider-class".to_string(),
            PKCS11_PROVIDER_CLASS.to_string(),
            "--provider-arg".to_string(),
            self.provider_arg.clone(),
            "--ks".to_string(),
            PKCS11_KEYSTORE.to_string(),
            "--ks-type".to_string(),
            PKCS11_KEYSTORE_TYPE.to_string(),
        ];
        if let Some(pin) = self.pin.as_deref().filter(|p| !p.is_empty()) {
            args.push("--ks-pass".to_string());
            args.push(format!("pass:{pin}"));
        }
        Ok(args)
    }
}

/// The signing material in use; exactly one per run
#[derive(Debug, Clone)]
pub enum SigningMaterial {
    Keystore(KeystoreDescriptor),
    Certificate(CertificateMaterial),
    Pkcs11(Pkcs11Material),
}

impl SigningMaterial {
    /// Select the material for `signature_type` from the configuration.
    ///
    /// The keystore variant needs the descriptor probed beforehand.
    pub fn select(
        signature_type: SignatureType,
        config: &ResignConfig,
        keystore: Option<KeystoreDescriptor>,
    ) -> Result<Self> {
        match signature_type {
            SignatureType::Keystore => keystore.map(Self::Keystore).ok_or_else(|| {
                SigningError::InvalidConfiguration("keystore was not loaded".to_string())
            }),
            SignatureType::Certificate => {
                match (&config.certificate.key_path, &config.certificate.cert_path) {
                    (Some(key_path), Some(cert_path)) => Ok(Self::Certificate(CertificateMaterial {
                        key_path: key_path.clone(),
                        cert_path: cert_path.clone(),
                    })),
                    _ => Err(SigningError::InvalidConfiguration(
                        "certificate key or certificate path is not set".to_string(),
                    )),
                }
            }
            SignatureType::Pkcs11 => config
                .pkcs11
                .provider_arg
                .clone()
                .map(|provider_arg| {
                    Self::Pkcs11(Pkcs11Material {
                        provider_arg,
                        pin: config.pkcs11.pin.clone(),
                    })
                })
                .ok_or_else(|| {
                    SigningError::InvalidConfiguration("PKCS#11 provider argument is not set".to_string())
                }),
        }
    }

    pub fn signature_type(&self) -> SignatureType {
        match self {
            Self::Keystore(_) => SignatureType::Keystore,
            Self::Certificate(_) => SignatureType::Certificate,
            Self::Pkcs11(_) => SignatureType::Pkcs11,
        }
    }

    /// The keystore, when this is keystore material
    pub fn keystore(&self) -> Option<&KeystoreDescriptor> {
        match self {
            Self::Keystore(descriptor) => Some(descriptor),
            _ => None,
        }
    }
}

impl MaterialArgs for SigningMaterial {
    fn apksigner_args(&self) -> Result<Vec<String>> {
        match self {
            Self::Keystore(descriptor) => descriptor.apksigner_args(),
            Self::Certificate(material) => material.apksigner_args(),
            Self::Pkcs11(material) => material.apksigner_args(),
        }
    }
}

/// Everything needed to build a signing invocation, fixed for the run
#[derive(Debug, Clone)]
pub struct SignatureConfiguration {
    material: SigningMaterial,
    scheme: SignerScheme,
    debuggable_permitted: bool,
}

impl SignatureConfiguration {
    pub fn new(material: SigningMaterial, scheme: SignerScheme, debuggable_permitted: bool) -> Self {
        Self {
            material,
            scheme,
            debuggable_permitted,
        }
    }

    pub fn material(&self) -> &SigningMaterial {
        &self.material
    }

    pub fn scheme(&self) -> SignerScheme {
        self.scheme
    }

    pub fn debuggable_permitted(&self) -> bool {
        self.debuggable_permitted
    }

    /// Scheme switch appended to apksigner, empty for automatic
    pub fn scheme_args(&self) -> Vec<String> {
        self.scheme
            .enable_flag()
            .map(|flag| vec![flag.to_string(), "true".to_string()])
            .unwrap_or_default()
    }
}
