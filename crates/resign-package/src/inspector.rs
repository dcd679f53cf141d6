//! Archive listing and signature detection

use std::path::{Path, PathBuf};

use resign_core::{CommandRunner, ToolCommand};
use tracing::debug;

use crate::error::{PackageError, Result};

/// Directory holding signature files
pub const META_INF: &str = "META-INF/";

/// Extensions removed when unsigning
pub const SIGNING_FILE_EXTENSIONS: [&str; 5] = ["mf", "rsa", "dsa", "ec", "sf"];

/// Extensions whose presence means the package carries a signature block
pub const SIGNATURE_BLOCK_EXTENSIONS: [&str; 2] = ["rsa", "dsa"];

fn extension_in(entry: &str, set: &[&str]) -> bool {
    if !entry.starts_with(META_INF) {
        return false;
    }
    Path::new(entry)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| set.iter().any(|known| known.eq_ignore_ascii_case(ext)))
}

/// META-INF entries with a signing-file extension, in input order
pub fn classify_signing_files(entries: &[String]) -> Vec<String> {
    entries
        .iter()
        .filter(|entry| extension_in(entry, &SIGNING_FILE_EXTENSIONS))
        .cloned()
        .collect()
}

/// Whether the entries include an RSA or DSA signature block.
///
/// Manifest and signature-file entries alone do not count.
pub fn has_signature_block(entries: &[String]) -> bool {
    entries
        .iter()
        .any(|entry| extension_in(entry, &SIGNATURE_BLOCK_EXTENSIONS))
}

/// Lists package entries with `aapt`
pub struct ArtifactInspector<'a> {
    runner: &'a dyn CommandRunner,
    aapt: PathBuf,
}

impl<'a> ArtifactInspector<'a> {
    pub fn new(runner: &'a dyn CommandRunner, aapt: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            aapt: aapt.into(),
        }
    }

    pub(crate) fn runner(&self) -> &'a dyn CommandRunner {
        self.runner
    }

    pub(crate) fn aapt(&self) -> &Path {
        &self.aapt
    }

    /// Every entry in the archive, read fresh from disk
    pub async fn list(&self, path: &Path) -> Result<Vec<String>> {
        let cmd = ToolCommand::new(&self.aapt).arg("list").path_arg(path);
        let output = self.runner.run(&cmd).await?;
        if !output.is_success() {
            return Err(PackageError::List {
                path: path.to_path_buf(),
                output: output.trimmed().to_string(),
            });
        }

        let entries: Vec<String> = output
            .output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        debug!(artifact = %path.display(), entries = entries.len(), "listed archive");
        Ok(entries)
    }

    /// Signing files currently in the archive
    pub async fn signing_files(&self, path: &Path) -> Result<Vec<String>> {
        Ok(classify_signing_files(&self.list(path).await?))
    }

    pub async fn is_signed(&self, path: &Path) -> Result<bool> {
        Ok(has_signature_block(&self.list(path).await?))
    }
}
