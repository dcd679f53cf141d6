//! Alignment decision and `zipalign`
//!
//! The required alignment is resolved per artifact: forced by configuration,
//! standard for bundles, and for APKs derived from the manifest's
//! `extractNativeLibs` flag. Uncompressed native libraries are mapped
//! straight from the package, so they need page alignment.

use std::path::{Path, PathBuf};

use resign_core::{AlignmentMode, Artifact, ArtifactType, CommandRunner, ToolCommand};
use tracing::{info, warn};

use crate::error::{PackageError, Result};
use crate::manifest::ManifestReader;

/// Byte alignment of uncompressed entries
pub const ALIGNMENT: &str = "4";

/// What the engine did with an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignOutcome {
    /// Already aligned, copied unchanged
    Copied,
    /// Rewritten by the aligner
    Aligned,
}

/// Page-align decision for one artifact.
///
/// `extract_native_libs` is only called for APKs in automatic mode; `None`
/// means the manifest could not be read and resolves to page alignment.
pub fn decide_page_aligned(
    mode: AlignmentMode,
    artifact_type: ArtifactType,
    extract_native_libs: impl FnOnce() -> Option<bool>,
) -> bool {
    match (mode, artifact_type) {
        (AlignmentMode::ForcePageAligned, _) => true,
        (AlignmentMode::ForceStandardAligned, _) => false,
        (AlignmentMode::Auto, ArtifactType::Aab) => false,
        (AlignmentMode::Auto, ArtifactType::Apk) => extract_native_libs().map_or(true, |extract| !extract),
    }
}

/// Decides the required alignment and enforces it with `zipalign`
pub struct AlignmentDecisionEngine<'a> {
    runner: &'a dyn CommandRunner,
    zipalign: PathBuf,
    manifest: &'a dyn ManifestReader,
}

impl<'a> AlignmentDecisionEngine<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        zipalign: impl Into<PathBuf>,
        manifest: &'a dyn ManifestReader,
    ) -> Self {
        Self {
            runner,
            zipalign: zipalign.into(),
            manifest,
        }
    }

    /// Whether `artifact` must be page aligned.
    ///
    /// The manifest is only read for APKs in automatic mode. A manifest that
    /// cannot be read resolves to page alignment.
    pub fn resolve_page_aligned(&self, mode: AlignmentMode, artifact: &Artifact) -> bool {
        decide_page_aligned(mode, artifact.artifact_type(), || {
            match self.manifest.extract_native_libs(artifact.path()) {
                Ok(extract_native_libs) => Some(extract_native_libs),
                Err(err) => {
                    warn!(
                        artifact = %artifact.path().display(),
                        error = %err,
                        "failed to read extractNativeLibs from the manifest, page aligning"
                    );
                    None
                }
            }
        })
    }

    fn command(&self, page_aligned: bool) -> ToolCommand {
        let cmd = ToolCommand::new(&self.zipalign);
        if page_aligned {
            cmd.arg("-p")
        } else {
            cmd
        }
    }

    /// `true` when `path` is already aligned as required.
    ///
    /// A non-zero exit from the check means "not aligned", not a failure.
    pub async fn check_alignment(&self, path: &Path, page_aligned: bool) -> Result<bool> {
        let cmd = self.command(page_aligned).args(["-c", ALIGNMENT]).path_arg(path);
        let output = self.runner.run(&cmd).await?;
        if output.is_success() {
            info!(artifact = %path.display(), "artifact alignment confirmed");
        }
        Ok(output.is_success())
    }

    /// Force-align `src` into `dst`
    pub async fn align_artifact(&self, src: &Path, dst: &Path, page_aligned: bool) -> Result<()> {
        let cmd = self
            .command(page_aligned)
            .args(["-f", ALIGNMENT])
            .path_arg(src)
            .path_arg(dst);
        let output = self.runner.run(&cmd).await?;
        if !output.is_success() {
            return Err(PackageError::Alignment {
                path: src.to_path_buf(),
                output: output.trimmed().to_string(),
            });
        }
        Ok(())
    }

    /// Resolve the alignment for `artifact` and write the aligned result to `dst`
    pub async fn run(&self, mode: AlignmentMode, artifact: &Artifact, dst: &Path) -> Result<AlignOutcome> {
        let page_aligned = self.resolve_page_aligned(mode, artifact);
        info!(
            artifact = %artifact.path().display(),
            %mode,
            page_aligned,
            "aligning artifact"
        );

        if self.check_alignment(artifact.path(), page_aligned).await? {
            tokio::fs::copy(artifact.path(), dst).await?;
            return Ok(AlignOutcome::Copied);
        }

        self.align_artifact(artifact.path(), dst, page_aligned).await?;
        Ok(AlignOutcome::Aligned)
    }
}
