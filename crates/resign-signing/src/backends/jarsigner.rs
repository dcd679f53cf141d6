//! jarsigner back-end
//!
//! jarsigner only understands Java keystores. The signature always uses the
//! keystore's cipher with a SHA1 digest so old package managers accept it.

use std::path::{Path, PathBuf};

use resign_core::{ArtifactType, ConfigError, ToolCommand};

use super::SigningBackend;
use crate::configuration::{SignatureConfiguration, SigningMaterial};
use crate::error::Result;
use crate::keystore::KeystoreDescriptor;

/// Printed by jarsigner after signing
pub const SIGN_MARKER: &str = "jar signed.";

/// Printed by `jarsigner -verify` on success
pub const VERIFY_MARKER: &str = "jar verified.";

/// Signature file name inside META-INF
const SIGFILE: &str = "CERT";

/// Signs APKs and bundles with the JDK `jarsigner`
pub struct JarsignerBackend {
    program: PathBuf,
    keystore: KeystoreDescriptor,
}

impl JarsignerBackend {
    /// Fails unless the configuration carries a keystore
    pub fn new(program: impl Into<PathBuf>, config: SignatureConfiguration) -> Result<Self> {
        let keystore = match config.material() {
            SigningMaterial::Keystore(descriptor) => descriptor.clone(),
            other => {
                return Err(ConfigError::UnsupportedCombination(format!(
                    "jarsigner can only sign with a keystore, not {}",
                    other.signature_type()
                ))
                .into())
            }
        };
        Ok(Self {
            program: program.into(),
            keystore,
        })
    }
}

impl SigningBackend for JarsignerBackend {
    fn name(&self) -> &'static str {
        "jarsigner"
    }

    fn supports(&self, _artifact_type: ArtifactType) -> bool {
        true
    }

    fn sign_command(&self, input: &Path, output: &Path) -> Result<ToolCommand> {
        let algorithm = self.keystore.algorithm();
        let mut cmd = ToolCommand::new(&self.program)
            .args(["-sigfile", SIGFILE])
            .arg("-sigalg")
            .arg(algorithm.signing_algorithm())
            .arg("-digestalg")
            .arg(algorithm.digest_algorithm())
            .arg("-keystore")
            .path_arg(self.keystore.path())
            .arg("-storepass")
            .arg(self.keystore.password());
        if let Some(key_password) = self.keystore.key_password() {
            cmd = cmd.arg("-keypass").arg(key_password);
        }
        Ok(cmd
            .arg("-signedjar")
            .path_arg(output)
            .path_arg(input)
            .arg(self.keystore.alias()))
    }

    fn verify_command(&self, path: &Path) -> ToolCommand {
        ToolCommand::new(&self.program)
            .args(["-verify", "-verbose", "-certs"])
            .path_arg(path)
    }

    fn sign_success_marker(&self) -> Option<&'static str> {
        Some(SIGN_MARKER)
    }

    fn verify_success_marker(&self) -> &'static str {
        VERIFY_MARKER
    }
}
