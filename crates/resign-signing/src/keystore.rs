//! Keystore probing
//!
//! The signature algorithm of the signing key is read once from `keytool`'s
//! verbose listing and kept in a [`KeystoreDescriptor`] for the whole run.

use std::fmt;
use std::path::{Path, PathBuf};

use resign_core::{CommandRunner, ToolCommand};
use tracing::{debug, info, warn};

use crate::error::{Result, SigningError};

/// Line prefix in `keytool -list -v` output carrying the algorithm
pub const SIGNATURE_ALGORITHM_MARKER: &str = "Signature algorithm name:";

/// Digest forced on every jarsigner signature
pub const SIGNING_DIGEST: &str = "SHA1";

/// A keystore signature algorithm such as `SHA256withRSA` or `MD5withRSAandMGF1`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureAlgorithm {
    name: String,
    digest: String,
    cipher: String,
    parameter: Option<String>,
}

impl SignatureAlgorithm {
    /// Parse `<digest>with<cipher>[and<param>]`
    pub fn parse(name: &str) -> Result<Self> {
        let unsupported = || SigningError::UnsupportedAlgorithm(name.to_string());

        let parts: Vec<&str> = name.split("with").collect();
        if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
            return Err(unsupported());
        }

        let (cipher, parameter) = match parts[1].split_once("and") {
            Some((cipher, parameter)) => (cipher, Some(parameter.to_string())),
            None => (parts[1], None),
        };
        if cipher.is_empty() {
            return Err(unsupported());
        }

        Ok(Self {
            name: name.to_string(),
            digest: parts[0].to_string(),
            cipher: cipher.to_string(),
            parameter,
        })
    }

    /// Name as reported by the keystore
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn cipher(&self) -> &str {
        &self.cipher
    }

    pub fn parameter(&self) -> Option<&str> {
        self.parameter.as_deref()
    }

    /// Algorithm handed to jarsigner: always SHA1 over the keystore's cipher,
    /// whatever digest the keystore declares.
    // TODO: make the digest configurable once older Android targets are dropped
    pub fn signing_algorithm(&self) -> String {
        format!("{SIGNING_DIGEST}with{}", self.cipher)
    }

    /// Digest handed to jarsigner
    pub fn digest_algorithm(&self) -> &'static str {
        SIGNING_DIGEST
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Extract the algorithm name from a keytool listing.
///
/// Only the first whitespace-separated token after the marker is kept; extra
/// tokens are logged and dropped.
pub fn find_signature_algorithm(listing: &str) -> Option<String> {
    for line in listing.lines() {
        let Some(index) = line.find(SIGNATURE_ALGORITHM_MARKER) else {
            continue;
        };
        let value = line[index + SIGNATURE_ALGORITHM_MARKER.len()..].trim();
        let mut tokens = value.split_whitespace();
        let algorithm = tokens.next()?;
        if tokens.next().is_some() {
            warn!(raw = %value, trimmed = %algorithm, "signature algorithm name has an unexpected suffix");
        }
        return Some(algorithm.to_string());
    }
    None
}

/// Reads the signature algorithm of a keystore entry with `keytool`
pub struct SignatureAlgorithmProbe<'a> {
    runner: &'a dyn CommandRunner,
    keytool: &'a Path,
}

impl<'a> SignatureAlgorithmProbe<'a> {
    pub fn new(runner: &'a dyn CommandRunner, keytool: &'a Path) -> Self {
        Self { runner, keytool }
    }

    fn list_command(&self, keystore: &Path, password: &str, alias: &str) -> ToolCommand {
        ToolCommand::new(self.keytool)
            .args(["-list", "-v", "-keystore"])
            .path_arg(keystore)
            .args(["-storepass", password, "-alias", alias])
            .args(["-J-Dfile.encoding=utf-8", "-J-Duser.language=en-US"])
    }

    /// Probe the algorithm name of `alias` in `keystore`
    pub async fn probe(&self, keystore: &Path, password: &str, alias: &str) -> Result<String> {
        let read_error = |reason: String| SigningError::KeystoreRead {
            keystore: keystore.to_path_buf(),
            reason,
        };

        if !keystore.exists() {
            return Err(read_error("keystore does not exist".to_string()));
        }

        let output = self
            .runner
            .run(&self.list_command(keystore, password, alias))
            .await?;

        if !output.is_success() {
            return Err(read_error(output.trimmed().to_string()));
        }
        if output.trimmed().is_empty() {
            return Err(read_error(format!(
                "empty listing, alias ({alias}) or password may be incorrect"
            )));
        }

        let algorithm = find_signature_algorithm(&output.output)
            .ok_or_else(|| read_error("no signature algorithm in keystore listing".to_string()))?;
        debug!(%alias, %algorithm, "probed keystore signature algorithm");
        Ok(algorithm)
    }
}

/// A keystore together with the algorithm probed from it
#[derive(Clone)]
pub struct KeystoreDescriptor {
    path: PathBuf,
    password: String,
    alias: String,
    key_password: Option<String>,
    algorithm: SignatureAlgorithm,
}

impl KeystoreDescriptor {
    /// Build a descriptor from an already known algorithm name
    pub fn new(
        path: impl Into<PathBuf>,
        password: impl Into<String>,
        alias: impl Into<String>,
        key_password: Option<String>,
        algorithm: &str,
    ) -> Result<Self> {
        Ok(Self {
            path: path.into(),
            password: password.into(),
            alias: alias.into(),
            key_password: key_password.filter(|p| !p.is_empty()),
            algorithm: SignatureAlgorithm::parse(algorithm)?,
        })
    }

    /// Probe the keystore and build the descriptor
    pub async fn probe(
        runner: &dyn CommandRunner,
        keytool: &Path,
        path: &Path,
        password: &str,
        alias: &str,
        key_password: Option<String>,
    ) -> Result<Self> {
        let algorithm = SignatureAlgorithmProbe::new(runner, keytool)
            .probe(path, password, alias)
            .await?;
        let descriptor = Self::new(path, password, alias, key_password, &algorithm)?;
        info!(
            keystore = %path.display(),
            %alias,
            algorithm = %descriptor.algorithm,
            "keystore ready"
        );
        Ok(descriptor)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Key password, only when one distinct from the store password was given
    pub fn key_password(&self) -> Option<&str> {
        self.key_password.as_deref()
    }

    pub fn algorithm(&self) -> &SignatureAlgorithm {
        &self.algorithm
    }
}

impl fmt::Debug for KeystoreDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeystoreDescriptor")
            .field("path", &self.path)
            .field("alias", &self.alias)
            .field("algorithm", &self.algorithm.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resign_core::exec::testing::ScriptedRunner;
    use resign_core::ToolOutput;
    use tempfile::TempDir;

    const LISTING: &str = "Alias name: MyAndroidKey
Creation date: Jun 2, 2016
Entry type: PrivateKeyEntry
Certificate chain length: 1
Certificate[1]:
Owner: CN=Example, OU=Mobile Development, O=MyCompany, L=Budapest, ST=Pest, C=HU
Issuer: CN=Example, OU=Mobile Development, O=MyCompany, L=Budapest, ST=Pest, C=HU
Serial number: 5750111
Valid from: Thu Jun 02 19:56:20 CEST 2016 until: Mon May 27 19:56:20 CEST 2041
Certificate fingerprints:
\t MD5:  CA:30:61:CB:AD:70:03:73:C7:FD:91:A4:9C:FB:92:F9
\t SHA1: 66:C3:60:5B:B8:0B:B0:2C:AE:C5:54:72:B6:B2:D6:18:99:FB:70:9F
\t Signature algorithm name: SHA1withRSA
\t Version: 3
";

    fn keystore_file(temp: &TempDir) -> PathBuf {
        let path = temp.path().join("release.jks");
        std::fs::write(&path, b"keystore").unwrap();
        path
    }

    #[test]
    fn test_find_signature_algorithm() {
        assert_eq!(find_signature_algorithm(LISTING).as_deref(), Some("SHA1withRSA"));
    }

    #[test]
    fn test_find_signature_algorithm_drops_suffix() {
        let listing = "Signature algorithm name: SHA256withRSA (weak)\n";
        assert_eq!(find_signature_algorithm(listing).as_deref(), Some("SHA256withRSA"));
    }

    #[test]
    fn test_find_signature_algorithm_missing() {
        assert_eq!(find_signature_algorithm("Alias name: key\nVersion: 3\n"), None);
        assert_eq!(find_signature_algorithm("Signature algorithm name:   \n"), None);
    }

    #[test]
    fn test_parse_signature_algorithm() {
        let alg = SignatureAlgorithm::parse("MD5withRSAandMGF1").unwrap();
        assert_eq!(alg.digest(), "MD5");
        assert_eq!(alg.cipher(), "RSA");
        assert_eq!(alg.parameter(), Some("MGF1"));
        assert_eq!(alg.signing_algorithm(), "SHA1withRSA");
        assert_eq!(alg.digest_algorithm(), "SHA1");

        let ec = SignatureAlgorithm::parse("SHA256withECDSA").unwrap();
        assert_eq!(ec.signing_algorithm(), "SHA1withECDSA");
        assert_eq!(ec.parameter(), None);
    }

    #[test]
    fn test_parse_rejects_malformed_algorithms() {
        for name in ["", "Ed25519", "withRSA", "SHA1with", "SHA1withRSAwithDSA"] {
            assert!(
                matches!(SignatureAlgorithm::parse(name), Err(SigningError::UnsupportedAlgorithm(_))),
                "{name} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_probe_reads_algorithm() {
        let temp = TempDir::new().unwrap();
        let keystore = keystore_file(&temp);
        let runner = ScriptedRunner::new().on("keytool", ToolOutput::success(LISTING));

        let descriptor = KeystoreDescriptor::probe(
            &runner,
            Path::new("keytool"),
            &keystore,
            "android",
            "MyAndroidKey",
            Some(String::new()),
        )
        .await
        .unwrap();

        assert_eq!(descriptor.algorithm().name(), "SHA1withRSA");
        assert_eq!(descriptor.key_password(), None);

        let calls = runner.calls_to("keytool");
        assert_eq!(calls.len(), 1);
        let args = calls[0].get_args();
        assert!(args.contains(&"-alias".to_string()));
        assert!(calls[0].printable().contains("-storepass ***"));
    }

    #[tokio::test]
    async fn test_probe_missing_keystore() {
        let runner = ScriptedRunner::new();
        let probe = SignatureAlgorithmProbe::new(&runner, Path::new("keytool"));
        let err = probe
            .probe(Path::new("/nonexistent/release.jks"), "pw", "key")
            .await
            .unwrap_err();
        assert!(matches!(err, SigningError::KeystoreRead { .. }));
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_probe_wrong_password() {
        let temp = TempDir::new().unwrap();
        let keystore = keystore_file(&temp);
        let runner = ScriptedRunner::new().on(
            "keytool",
            ToolOutput::failure(1, "keytool error: java.io.IOException: Keystore was tampered with, or password was incorrect"),
        );

        let err = SignatureAlgorithmProbe::new(&runner, Path::new("keytool"))
            .probe(&keystore, "wrong", "key")
            .await
            .unwrap_err();
        match err {
            SigningError::KeystoreRead { reason, .. } => assert!(reason.contains("password was incorrect")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_probe_empty_or_markerless_output() {
        let temp = TempDir::new().unwrap();
        let keystore = keystore_file(&temp);

        let empty = ScriptedRunner::new().on("keytool", ToolOutput::success("  \n"));
        assert!(matches!(
            SignatureAlgorithmProbe::new(&empty, Path::new("keytool"))
                .probe(&keystore, "pw", "key")
                .await,
            Err(SigningError::KeystoreRead { .. })
        ));

        let markerless = ScriptedRunner::new().on("keytool", ToolOutput::success("Alias name: key\n"));
        assert!(matches!(
            SignatureAlgorithmProbe::new(&markerless, Path::new("keytool"))
                .probe(&keystore, "pw", "key")
                .await,
            Err(SigningError::KeystoreRead { .. })
        ));
    }
}
