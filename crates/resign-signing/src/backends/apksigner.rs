//! apksigner back-end

use std::path::{Path, PathBuf};

use resign_core::{ArtifactType, ToolCommand};

use super::SigningBackend;
use crate::configuration::{MaterialArgs, SignatureConfiguration};
use crate::error::Result;

/// Printed by `apksigner verify --verbose` on success
pub const VERIFY_MARKER: &str = "Verifies";

/// Signs APKs with the build-tools `apksigner`
pub struct ApksignerBackend {
    program: PathBuf,
    config: SignatureConfiguration,
}

impl ApksignerBackend {
    pub fn new(program: impl Into<PathBuf>, config: SignatureConfiguration) -> Self {
        Self {
            program: program.into(),
            config,
        }
    }
}

impl SigningBackend for ApksignerBackend {
    fn name(&self) -> &'static str {
        "apksigner"
    }

    fn supports(&self, artifact_type: ArtifactType) -> bool {
        artifact_type == ArtifactType::Apk
    }

    fn sign_command(&self, input: &Path, output: &Path) -> Result<ToolCommand> {
        let material_args = self.config.material().apksigner_args()?;

        Ok(ToolCommand::new(&self.program)
            .arg("sign")
            .arg("--in")
            .path_arg(input)
            .arg("--out")
            .path_arg(output)
            .arg("--debuggable-apk-permitted")
            .arg(self.config.debuggable_permitted().to_string())
            .args(self.config.scheme_args())
            .args(material_args))
    }

    fn verify_command(&self, path: &Path) -> ToolCommand {
        ToolCommand::new(&self.program)
            .args(["verify", "--verbose", "--in"])
            .path_arg(path)
    }

    fn sign_success_marker(&self) -> Option<&'static str> {
        None
    }

    fn verify_success_marker(&self) -> &'static str {
        VERIFY_MARKER
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::{Pkcs11Material, SigningMaterial};
    use crate::keystore::KeystoreDescriptor;
    use resign_core::SignerScheme;

    fn backend(scheme: SignerScheme, debuggable: bool) -> ApksignerBackend {
        let descriptor = KeystoreDescriptor::new(
            "/keys/release.jks",
            "storepw",
            "upload",
            Some("keypw".to_string()),
            "SHA256withRSA",
        )
        .unwrap();
        ApksignerBackend::new(
            "apksigner",
            SignatureConfiguration::new(SigningMaterial::Keystore(descriptor), scheme, debuggable),
        )
    }

    #[test]
    fn test_sign_command_layout() {
        let cmd = backend(SignerScheme::Automatic, true)
            .sign_command(Path::new("/w/unsigned.apk"), Path::new("/w/signed.apk"))
            .unwrap();
        assert_eq!(
            cmd.get_args(),
            [
                "sign",
                "--in",
                "/w/unsigned.apk",
                "--out",
                "/w/signed.apk",
                "--debuggable-apk-permitted",
                "true",
                "--ks",
                "/keys/release.jks",
                "--ks-pass",
                "pass:storepw",
                "--ks-key-alias",
                "upload",
                "--key-pass",
                "pass:keypw",
            ]
        );
        assert!(!cmd.printable().contains("storepw"));
    }

    #[test]
    fn test_sign_command_with_scheme() {
        let cmd = backend(SignerScheme::V4, false)
            .sign_command(Path::new("in.apk"), Path::new("out.apk"))
            .unwrap();
        let printable = cmd.printable();
        assert!(printable.contains("--debuggable-apk-permitted false"));
        assert!(printable.contains("--v4-signing-enabled true"));
    }

    #[test]
    fn test_sign_command_pkcs11() {
        let backend = ApksignerBackend::new(
            "apksigner",
            SignatureConfiguration::new(
                SigningMaterial::Pkcs11(Pkcs11Material {
                    provider_arg: "token.cfg".to_string(),
                    pin: Some("0000".to_string()),
                }),
                SignerScheme::Automatic,
                true,
            ),
        );
        let cmd = backend.sign_command(Path::new("in.apk"), Path::new("out.apk")).unwrap();
        assert!(cmd.printable().contains("--ks NONE --ks-type PKCS11 --ks-pass ***"));
    }

    #[test]
    fn test_verify_command() {
        let backend = backend(SignerScheme::Automatic, true);
        let cmd = backend.verify_command(Path::new("signed.apk"));
        assert_eq!(cmd.get_args(), ["verify", "--verbose", "--in", "signed.apk"]);
        assert_eq!(backend.verify_success_marker(), "Verifies");
        assert!(backend.supports(ArtifactType::Apk));
        assert!(!backend.supports(ArtifactType::Aab));
    }
}
