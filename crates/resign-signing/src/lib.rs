//! apk-resign signing
//!
//! Keystore probing, the signing configuration and the two signer back-ends
//! (`apksigner` and `jarsigner`), plus the stage that signs and verifies.

pub mod backends;
pub mod configuration;
pub mod error;
pub mod keystore;
pub mod stage;

pub use backends::{select_backend, ApksignerBackend, JarsignerBackend, SigningBackend};
pub use configuration::{
    CertificateMaterial, MaterialArgs, Pkcs11Material, SignatureConfiguration, SigningMaterial,
};
pub use error::{Result, SigningError};
pub use keystore::{KeystoreDescriptor, SignatureAlgorithm, SignatureAlgorithmProbe};
pub use stage::SignStage;
