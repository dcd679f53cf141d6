//! Inspect command - signing and alignment details of one artifact

use std::path::{Path, PathBuf};

use clap::Args;
use serde::Serialize;
use tracing::info;

use resign_core::{AlignmentMode, Artifact, ArtifactType, CommandRunner, ProcessRunner, ToolPaths};
use resign_package::{
    classify_signing_files, decide_page_aligned, has_signature_block, ApkManifestReader,
    ArtifactInspector, ManifestReader,
};

use crate::cli::output;
use crate::cli::{Cli, OutputFormat};

/// Show signing and alignment details of an artifact
#[derive(Debug, Args)]
pub struct InspectCommand {
    /// APK or AAB to inspect
    pub artifact: PathBuf,

    /// Alignment mode the page-align decision is resolved for
    #[arg(long, env = "PAGE_ALIGN", default_value = "automatic")]
    pub page_align: AlignmentMode,
}

/// What `inspect` reports
#[derive(Debug, Serialize)]
pub struct InspectReport {
    pub path: PathBuf,
    pub artifact_type: String,
    pub entries: usize,
    pub signing_files: Vec<String>,
    pub signed: bool,
    /// `None` for bundles and unreadable manifests
    pub extract_native_libs: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_error: Option<String>,
    pub page_aligned: bool,
}

/// Build the report for `artifact`
pub async fn inspect(
    runner: &dyn CommandRunner,
    tools: &ToolPaths,
    manifest: &dyn ManifestReader,
    artifact: &Artifact,
    mode: AlignmentMode,
) -> anyhow::Result<InspectReport> {
    let entries = ArtifactInspector::new(runner, &tools.aapt)
        .list(artifact.path())
        .await?;

    let (extract_native_libs, manifest_error) = match artifact.artifact_type() {
        ArtifactType::Apk => match manifest.extract_native_libs(artifact.path()) {
            Ok(value) => (Some(value), None),
            Err(err) => (None, Some(err.to_string())),
        },
        ArtifactType::Aab => (None, None),
    };

    let page_aligned = decide_page_aligned(mode, artifact.artifact_type(), || extract_native_libs);

    Ok(InspectReport {
        path: artifact.path().to_path_buf(),
        artifact_type: artifact.artifact_type().to_string(),
        entries: entries.len(),
        signing_files: classify_signing_files(&entries),
        signed: has_signature_block(&entries),
        extract_native_libs,
        manifest_error,
        page_aligned,
    })
}

impl InspectCommand {
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(artifact = %self.artifact.display(), "executing inspect command");
        if !self.artifact.exists() {
            return Err(resign_core::ConfigError::ArtifactNotFound(self.artifact.clone()).into());
        }
        let artifact = Artifact::new(&self.artifact)?;
        let tools = ToolPaths::discover()?;
        let runner = ProcessRunner::new();
        let manifest = ApkManifestReader::new();

        let rt = tokio::runtime::Runtime::new()?;
        let report = rt.block_on(inspect(&runner, &tools, &manifest, &artifact, self.page_align))?;

        match cli.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            OutputFormat::Text if !cli.quiet => print_report(&report),
            OutputFormat::Text => {}
        }
        Ok(())
    }
}

fn print_report(report: &InspectReport) {
    println!("{}", output::header(&display_name(&report.path)));
    println!("{}", output::key_value("type", &report.artifact_type));
    println!("{}", output::key_value("entries", &report.entries.to_string()));
    println!("{}", output::key_value("signed", &report.signed.to_string()));
    let files = if report.signing_files.is_empty() {
        "-".to_string()
    } else {
        report.signing_files.join(", ")
    };
    println!("{}", output::key_value("signing files", &files));
    if let Some(value) = report.extract_native_libs {
        println!("{}", output::key_value("extractNativeLibs", &value.to_string()));
    }
    if let Some(err) = &report.manifest_error {
        output::warning(&format!("Manifest could not be read: {err}"));
    }
    println!("{}", output::key_value("page aligned", &report.page_aligned.to_string()));
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use resign_core::exec::testing::ScriptedRunner;
    use resign_core::ToolOutput;
    use resign_package::ManifestParseError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct BrokenManifest;

    impl ManifestReader for BrokenManifest {
        fn extract_native_libs(&self, _path: &Path) -> Result<bool, ManifestParseError> {
            Err(ManifestParseError::Manifest("no <manifest> element".to_string()))
        }
    }

    struct CountingManifest {
        extract_native_libs: bool,
        reads: AtomicUsize,
    }

    impl ManifestReader for CountingManifest {
        fn extract_native_libs(&self, _path: &Path) -> Result<bool, ManifestParseError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(self.extract_native_libs)
        }
    }

    fn tools() -> ToolPaths {
        ToolPaths {
            aapt: PathBuf::from("aapt"),
            zipalign: PathBuf::from("zipalign"),
            apksigner: None,
            keytool: None,
            jarsigner: None,
        }
    }

    #[tokio::test]
    async fn test_report_for_signed_apk_with_broken_manifest() {
        let runner = ScriptedRunner::new().on(
            "aapt",
            ToolOutput::success("AndroidManifest.xml\nMETA-INF/MANIFEST.MF\nMETA-INF/CERT.SF\nMETA-INF/CERT.RSA\n"),
        );
        let artifact = Artifact::new("app.apk").unwrap();

        let report = inspect(&runner, &tools(), &BrokenManifest, &artifact, AlignmentMode::Auto)
            .await
            .unwrap();
        assert_eq!(report.artifact_type, "APK");
        assert_eq!(report.entries, 4);
        assert!(report.signed);
        assert_eq!(report.signing_files.len(), 3);
        assert_eq!(report.extract_native_libs, None);
        assert!(report.manifest_error.is_some());
        assert!(report.page_aligned);
        assert!(runner.calls_to("zipalign").is_empty());
    }

    #[tokio::test]
    async fn test_bundle_skips_the_manifest() {
        let runner = ScriptedRunner::new().on("aapt", ToolOutput::success("BundleConfig.pb\n"));
        let artifact = Artifact::new("app.aab").unwrap();

        let report = inspect(&runner, &tools(), &BrokenManifest, &artifact, AlignmentMode::Auto)
            .await
            .unwrap();
        assert!(!report.signed);
        assert!(!report.page_aligned);
        assert!(report.manifest_error.is_none());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["artifact_type"], "AAB");
        assert!(json.get("manifest_error").is_none());
    }

    #[tokio::test]
    async fn test_manifest_is_read_once() {
        let runner = ScriptedRunner::new().on(
            "aapt",
            ToolOutput::success("AndroidManifest.xml\nlib/arm64-v8a/libapp.so\n"),
        );
        let artifact = Artifact::new("app.apk").unwrap();

        for (extract_native_libs, page_aligned) in [(true, false), (false, true)] {
            let manifest = CountingManifest {
                extract_native_libs,
                reads: AtomicUsize::new(0),
            };
            let report = inspect(&runner, &tools(), &manifest, &artifact, AlignmentMode::Auto)
                .await
                .unwrap();
            assert_eq!(report.extract_native_libs, Some(extract_native_libs));
            assert_eq!(report.page_aligned, page_aligned);
            assert_eq!(manifest.reads.load(Ordering::SeqCst), 1);
        }
    }
}
