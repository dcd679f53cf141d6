//! Signer back-ends
//!
//! A back-end turns a [`SignatureConfiguration`] into the sign and verify
//! invocations of one signing tool. The stage that runs them lives in
//! [`crate::stage`].

pub mod apksigner;
pub mod jarsigner;

use std::path::Path;

use resign_core::{ArtifactType, ConfigError, SignerTool, ToolCommand, ToolPaths};
use tracing::debug;

use crate::configuration::SignatureConfiguration;
use crate::error::Result;

pub use apksigner::ApksignerBackend;
pub use jarsigner::JarsignerBackend;

/// A signing tool
pub trait SigningBackend: Send + Sync {
    /// Tool name used in logs
    fn name(&self) -> &'static str;

    /// Whether this back-end can sign the given artifact type
    fn supports(&self, artifact_type: ArtifactType) -> bool;

    /// Command signing `input` into `output`
    fn sign_command(&self, input: &Path, output: &Path) -> Result<ToolCommand>;

    /// Command verifying a signed file
    fn verify_command(&self, path: &Path) -> ToolCommand;

    /// Text that must appear in the sign output, if the tool prints one
    fn sign_success_marker(&self) -> Option<&'static str>;

    /// Text that must appear in the verify output
    fn verify_success_marker(&self) -> &'static str;
}

/// Pick the back-end for one artifact.
///
/// `Automatic` uses jarsigner for bundles and apksigner for APKs when it is
/// installed, falling back to jarsigner otherwise.
pub fn select_backend(
    tool: SignerTool,
    artifact_type: ArtifactType,
    config: &SignatureConfiguration,
    paths: &ToolPaths,
) -> Result<Box<dyn SigningBackend>> {
    let resolved = match tool {
        SignerTool::Automatic => match (artifact_type, paths.apksigner.is_some()) {
            (ArtifactType::Apk, true) => SignerTool::Apksigner,
            _ => SignerTool::Jarsigner,
        },
        explicit => explicit,
    };

    let backend: Box<dyn SigningBackend> = match resolved {
        SignerTool::Apksigner => {
            let apksigner = paths.apksigner().map_err(|_| {
                ConfigError::UnsupportedCombination(
                    "apksigner was requested but is not installed in build-tools".to_string(),
                )
            })?;
            Box::new(ApksignerBackend::new(apksigner, config.clone()))
        }
        _ => Box::new(JarsignerBackend::new(paths.jarsigner()?, config.clone())?),
    };

    if !backend.supports(artifact_type) {
        return Err(ConfigError::UnsupportedCombination(format!(
            "{} cannot sign {artifact_type} artifacts, use jarsigner",
            backend.name()
        ))
        .into());
    }

    debug!(requested = %tool, backend = backend.name(), %artifact_type, "selected signer");
    Ok(backend)
}
