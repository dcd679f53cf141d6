//! Sign and verify

use std::path::Path;

use resign_core::CommandRunner;
use tracing::info;

use crate::backends::SigningBackend;
use crate::error::{Result, SigningError};

/// Runs a back-end's sign command followed by its verify command
pub struct SignStage<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> SignStage<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    /// Sign `input` into `output`, then verify `output`
    pub async fn run(&self, backend: &dyn SigningBackend, input: &Path, output: &Path) -> Result<()> {
        info!(artifact = %input.display(), signer = backend.name(), "signing artifact");

        let signed = self.runner.run(&backend.sign_command(input, output)?).await?;
        let marker_missing = backend
            .sign_success_marker()
            .is_some_and(|marker| !signed.output.contains(marker));
        if !signed.is_success() || marker_missing {
            return Err(SigningError::SignFailed {
                path: input.to_path_buf(),
                output: signed.trimmed().to_string(),
            });
        }

        self.verify(backend, output).await
    }

    /// Verify a signed file with the back-end's verifier
    pub async fn verify(&self, backend: &dyn SigningBackend, path: &Path) -> Result<()> {
        let verified = self.runner.run(&backend.verify_command(path)).await?;
        if !verified.is_success() || !verified.output.contains(backend.verify_success_marker()) {
            return Err(SigningError::VerificationFailed {
                path: path.to_path_buf(),
                output: verified.trimmed().to_string(),
            });
        }
        info!(artifact = %path.display(), "signature verified");
        Ok(())
    }
}
