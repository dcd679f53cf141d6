//! Signature removal

use std::path::Path;

use resign_core::ToolCommand;
use tracing::info;

use crate::error::{PackageError, Result};
use crate::inspector::{classify_signing_files, has_signature_block, ArtifactInspector};

/// What [`UnsignStage::run`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnsignOutcome {
    /// No signature block, nothing touched
    AlreadyUnsigned,
    /// These entries were removed
    Removed(Vec<String>),
}

/// Strips signature files from a package in place with `aapt remove`
pub struct UnsignStage<'a> {
    inspector: &'a ArtifactInspector<'a>,
}

impl<'a> UnsignStage<'a> {
    pub fn new(inspector: &'a ArtifactInspector<'a>) -> Self {
        Self { inspector }
    }

    pub async fn run(&self, path: &Path) -> Result<UnsignOutcome> {
        let entries = self.inspector.list(path).await?;
        if !has_signature_block(&entries) {
            info!(artifact = %path.display(), "artifact is not signed, nothing to remove");
            return Ok(UnsignOutcome::AlreadyUnsigned);
        }

        let signing_files = classify_signing_files(&entries);
        info!(artifact = %path.display(), files = ?signing_files, "removing signature files");

        let cmd = ToolCommand::new(self.inspector.aapt())
            .arg("remove")
            .path_arg(path)
            .args(signing_files.iter().cloned());
        let output = self.inspector.runner().run(&cmd).await?;
        if !output.is_success() {
            return Err(PackageError::Unsign {
                path: path.to_path_buf(),
                output: output.trimmed().to_string(),
            });
        }

        Ok(UnsignOutcome::Removed(signing_files))
    }
}
