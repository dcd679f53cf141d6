//! The resigning pipeline
//!
//! Artifacts are processed one after another. Each one is copied into its own
//! working directory, stripped of any existing signature, signed and verified,
//! then aligned into its final location. The first failure aborts the run so
//! that no partial result is ever exported.

use std::path::{Path, PathBuf};

use resign_core::config::ResignConfig;
use resign_core::{
    AlignmentMode, Artifact, ArtifactType, CommandRunner, ConfigError, SignatureType, SignerTool,
    ToolPaths,
};
use resign_package::{AlignmentDecisionEngine, ArtifactInspector, ManifestReader, UnsignStage};
use resign_signing::{
    select_backend, KeystoreDescriptor, SignStage, SignatureConfiguration, SigningMaterial,
};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::keystore_source::KeystoreSource;
use crate::naming::{indexed_path, output_path, work_dir_name};

/// Per-run pipeline options
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Alignment mode
    pub alignment: AlignmentMode,
    /// Requested signer tool
    pub signer_tool: SignerTool,
    /// Shared output base name
    pub output_name: Option<String>,
    /// Output directory; each input's directory when unset
    pub output_dir: Option<PathBuf>,
}

impl PipelineOptions {
    pub fn from_config(config: &ResignConfig) -> Self {
        Self {
            alignment: config.alignment.mode,
            signer_tool: config.signing.signer_tool,
            output_name: config.output.name.clone().filter(|n| !n.trim().is_empty()),
            output_dir: config.output.directory.clone(),
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }
}

/// Signed outputs of a run, in input order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineResult {
    outputs: Vec<Artifact>,
}

impl PipelineResult {
    pub fn push(&mut self, output: Artifact) {
        self.outputs.push(output);
    }

    pub fn outputs(&self) -> &[Artifact] {
        &self.outputs
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Whether an output was already written to `path`
    pub fn contains(&self, path: &Path) -> bool {
        self.outputs.iter().any(|a| a.path() == path)
    }

    fn of_type(&self, artifact_type: ArtifactType) -> Vec<&Path> {
        self.outputs
            .iter()
            .filter(|a| a.artifact_type() == artifact_type)
            .map(Artifact::path)
            .collect()
    }

    /// Signed APKs
    pub fn apks(&self) -> Vec<&Path> {
        self.of_type(ArtifactType::Apk)
    }

    /// Signed bundles
    pub fn aabs(&self) -> Vec<&Path> {
        self.of_type(ArtifactType::Aab)
    }
}

/// Build the signing configuration for a run.
///
/// For keystore signing the keystore is resolved (downloading it into
/// `work_dir` when it is remote) and its signature algorithm probed.
pub async fn load_signature_configuration(
    runner: &dyn CommandRunner,
    tools: &ToolPaths,
    config: &ResignConfig,
    work_dir: &Path,
) -> Result<SignatureConfiguration> {
    let signature_type = config
        .signature_type()
        .ok_or_else(|| ConfigError::MissingField("keystore.url".to_string()))?;
    debug!(%signature_type, "signature type");

    let keystore = match signature_type {
        SignatureType::Keystore => Some(load_keystore(runner, tools, config, work_dir).await?),
        _ => None,
    };

    let material = SigningMaterial::select(signature_type, config, keystore)?;
    Ok(SignatureConfiguration::new(
        material,
        config.signing.signer_scheme,
        config.signing.debuggable_permitted,
    ))
}

async fn load_keystore(
    runner: &dyn CommandRunner,
    tools: &ToolPaths,
    config: &ResignConfig,
    work_dir: &Path,
) -> Result<KeystoreDescriptor> {
    let required = |value: &Option<String>, field: &str| {
        value
            .as_deref()
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .ok_or_else(|| ConfigError::MissingField(field.to_string()))
    };
    let url = required(&config.keystore.url, "keystore.url")?;
    let password = required(&config.keystore.password, "keystore.password")?;
    let alias = required(&config.keystore.alias, "keystore.alias")?;

    let path = KeystoreSource::parse(&url)?.resolve(work_dir).await?;
    let descriptor = KeystoreDescriptor::probe(
        runner,
        tools.keytool()?,
        &path,
        &password,
        &alias,
        config.keystore.key_password.clone(),
    )
    .await?;
    Ok(descriptor)
}

/// Runs every artifact through unsign, sign and align
pub struct ResignPipeline<'a> {
    runner: &'a dyn CommandRunner,
    tools: &'a ToolPaths,
    signature: &'a SignatureConfiguration,
    manifest: &'a dyn ManifestReader,
    options: PipelineOptions,
    work_dir: PathBuf,
}

impl<'a> ResignPipeline<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        tools: &'a ToolPaths,
        signature: &'a SignatureConfiguration,
        manifest: &'a dyn ManifestReader,
        options: PipelineOptions,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runner,
            tools,
            signature,
            manifest,
            options,
            work_dir: work_dir.into(),
        }
    }

    /// Resign every artifact, stopping at the first failure
    pub async fn run(&self, artifacts: &[Artifact]) -> Result<PipelineResult> {
        info!(
            artifacts = artifacts.len(),
            signature_type = %self.signature.material().signature_type(),
            alignment = %self.options.alignment,
            "starting resign pipeline"
        );

        let mut result = PipelineResult::default();
        for (index, artifact) in artifacts.iter().enumerate() {
            let output = self.resign(index, artifact, &result).await?;
            result.push(output);
        }

        info!(
            apks = result.apks().len(),
            aabs = result.aabs().len(),
            "resign pipeline complete"
        );
        Ok(result)
    }

    async fn resign(&self, index: usize, artifact: &Artifact, produced: &PipelineResult) -> Result<Artifact> {
        info!(index, artifact = %artifact.path().display(), "resigning artifact");

        let dir = self.work_dir.join(work_dir_name(index, artifact));
        tokio::fs::create_dir_all(&dir).await?;
        let ext = artifact.extension();

        let unsigned = dir.join(format!("unsigned{ext}"));
        tokio::fs::copy(artifact.path(), &unsigned).await?;

        let inspector = ArtifactInspector::new(self.runner, &self.tools.aapt);
        UnsignStage::new(&inspector).run(&unsigned).await?;

        let backend = select_backend(
            self.options.signer_tool,
            artifact.artifact_type(),
            self.signature,
            self.tools,
        )?;
        let signed = dir.join(format!("signed{ext}"));
        SignStage::new(self.runner)
            .run(backend.as_ref(), &unsigned, &signed)
            .await?;

        let mut destination = output_path(
            artifact,
            index,
            self.options.output_name.as_deref(),
            self.options.output_dir.as_deref(),
        );
        if produced.contains(&destination) {
            let taken = destination;
            destination = indexed_path(&taken, index);
            if produced.contains(&destination) {
                return Err(ConfigError::invalid(
                    "output",
                    format!("more than one artifact resolves to {}", taken.display()),
                )
                .into());
            }
            warn!(
                artifact = %artifact.path().display(),
                taken = %taken.display(),
                output = %destination.display(),
                "output name already used in this run, adding the artifact index"
            );
        }
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let engine = AlignmentDecisionEngine::new(self.runner, &self.tools.zipalign, self.manifest);
        let outcome = engine
            .run(self.options.alignment, &artifact.with_path(&signed), &destination)
            .await?;

        info!(
            artifact = %artifact.path().display(),
            output = %destination.display(),
            ?outcome,
            "artifact resigned"
        );
        Ok(artifact.with_path(destination))
    }
}
