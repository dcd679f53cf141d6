//! Run command - resign every configured artifact

use std::path::PathBuf;

use clap::Args;
use tracing::{debug, info};

use resign_core::config::{load_config, load_config_or_default, split_artifact_list, validate_config, ResignConfig};
use resign_core::{
    AlignmentMode, Artifact, ProcessRunner, SignatureType, SignerScheme, SignerTool, ToolPaths,
};
use resign_package::ApkManifestReader;
use resign_workflow::{
    load_signature_configuration, redact_url, KeystoreSource, OutputExporter, PipelineOptions,
    PipelineResult, ResignPipeline,
};

use crate::cli::output::{self, masked};
use crate::cli::{Cli, OutputFormat};
use crate::exit_codes::Cancelled;

/// Unsign, sign, verify and align artifacts.
///
/// Every flag overrides the config file and can also be given through the
/// environment variable shown in its help.
#[derive(Debug, Default, Args)]
pub struct RunCommand {
    /// Config file; searched for from the working directory when unset
    #[arg(long, env = "APK_RESIGN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Artifacts to resign, separated by `|` or newlines
    #[arg(long = "artifacts", env = "ARTIFACT_PATH")]
    pub artifacts: Option<String>,

    /// Keystore path, file:// or http(s) URL
    #[arg(long, env = "KEYSTORE_URL", hide_env_values = true)]
    pub keystore_url: Option<String>,

    /// Keystore password
    #[arg(long, env = "KEYSTORE_PASSWORD", hide_env_values = true)]
    pub keystore_password: Option<String>,

    /// Key alias
    #[arg(long, env = "KEYSTORE_ALIAS")]
    pub keystore_alias: Option<String>,

    /// Key password, when it differs from the keystore password
    #[arg(long, env = "PRIVATE_KEY_PASSWORD", hide_env_values = true)]
    pub key_password: Option<String>,

    /// PKCS#8 private key for certificate signing
    #[arg(long, env = "SIGNING_KEY_PATH")]
    pub signing_key_path: Option<PathBuf>,

    /// X.509 certificate for certificate signing
    #[arg(long, env = "SIGNING_CERT_PATH")]
    pub signing_cert_path: Option<PathBuf>,

    /// PKCS#11 provider argument
    #[arg(long, env = "PKCS11_PROVIDER_ARG")]
    pub pkcs11_provider_arg: Option<String>,

    /// PKCS#11 token PIN
    #[arg(long, env = "PKCS11_PIN", hide_env_values = true)]
    pub pkcs11_pin: Option<String>,

    /// Signing material (keystore, certificate, pkcs11); inferred when unset
    #[arg(long, env = "SIGNATURE_TYPE")]
    pub signature_type: Option<SignatureType>,

    /// Signer tool (automatic, apksigner, jarsigner)
    #[arg(long, env = "SIGNER_TOOL")]
    pub signer_tool: Option<SignerTool>,

    /// Signature scheme for apksigner (automatic, v2, v3, v4)
    #[arg(long, env = "SIGNER_SCHEME")]
    pub signer_scheme: Option<SignerScheme>,

    /// Page alignment (automatic, true, false)
    #[arg(long, env = "PAGE_ALIGN")]
    pub page_align: Option<AlignmentMode>,

    /// Allow signing debuggable APKs (apksigner only)
    #[arg(long, env = "DEBUGGABLE_PERMITTED")]
    pub debuggable_permitted: Option<bool>,

    /// Base name of the produced files
    #[arg(long, env = "OUTPUT_NAME")]
    pub output_name: Option<String>,

    /// Directory for the produced files
    #[arg(long, env = "OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Append KEY=value lines for the produced paths to this file
    #[arg(long, env = "EXPORT_FILE")]
    pub export_file: Option<PathBuf>,

    /// Do not export through envman
    #[arg(long)]
    pub no_envman: bool,
}

fn override_with<T: Clone>(slot: &mut Option<T>, value: &Option<T>) {
    if value.is_some() {
        *slot = value.clone();
    }
}

fn override_string(slot: &mut Option<String>, value: &Option<String>) {
    if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
        *slot = Some(v.to_string());
    }
}

impl RunCommand {
    /// Overlay the flags on a loaded configuration
    pub fn apply(&self, config: &mut ResignConfig) {
        if let Some(raw) = &self.artifacts {
            let paths = split_artifact_list(raw);
            if !paths.is_empty() {
                config.inputs.artifacts = paths;
            }
        }

        override_string(&mut config.keystore.url, &self.keystore_url);
        override_string(&mut config.keystore.password, &self.keystore_password);
        override_string(&mut config.keystore.alias, &self.keystore_alias);
        override_string(&mut config.keystore.key_password, &self.key_password);
        override_with(&mut config.certificate.key_path, &self.signing_key_path);
        override_with(&mut config.certificate.cert_path, &self.signing_cert_path);
        override_string(&mut config.pkcs11.provider_arg, &self.pkcs11_provider_arg);
        override_string(&mut config.pkcs11.pin, &self.pkcs11_pin);
        override_with(&mut config.signing.signature_type, &self.signature_type);
        override_string(&mut config.output.name, &self.output_name);
        override_with(&mut config.output.directory, &self.output_dir);
        override_with(&mut config.export.file, &self.export_file);

        if let Some(tool) = self.signer_tool {
            config.signing.signer_tool = tool;
        }
        if let Some(scheme) = self.signer_scheme {
            config.signing.signer_scheme = scheme;
        }
        if let Some(mode) = self.page_align {
            config.alignment.mode = mode;
        }
        if let Some(permitted) = self.debuggable_permitted {
            config.signing.debuggable_permitted = permitted;
        }
        if self.no_envman {
            config.export.envman = false;
        }
    }

    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!("executing run command");
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(async {
            tokio::select! {
                result = self.run(cli) => result,
                _ = tokio::signal::ctrl_c() => Err(Cancelled.into()),
            }
        })
    }

    async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cwd = std::env::current_dir()?;
        let (mut config, config_path) = match &self.config {
            Some(path) => (load_config(path)?, Some(path.clone())),
            None => load_config_or_default(&cwd)?,
        };
        self.apply(&mut config);
        validate_config(&config)?;

        if cli.prints_text() {
            println!("{}", output::header("Configuration"));
            if let Some(path) = &config_path {
                println!("{}", output::key_value("config file", &path.display().to_string()));
            }
            for (key, value) in config_summary(&config) {
                println!("{}", output::key_value(key, &value));
            }
            println!();
        }

        let tools = ToolPaths::discover()?;
        let runner = ProcessRunner::new();
        let work_dir = tempfile::Builder::new().prefix("apk-resign-").tempdir()?;
        debug!(work_dir = %work_dir.path().display(), "created working directory");

        let signature = load_signature_configuration(&runner, &tools, &config, work_dir.path()).await?;
        let artifacts = config
            .inputs
            .artifacts
            .iter()
            .map(Artifact::new)
            .collect::<Result<Vec<_>, _>>()?;

        let manifest = ApkManifestReader::new();
        let pipeline = ResignPipeline::new(
            &runner,
            &tools,
            &signature,
            &manifest,
            PipelineOptions::from_config(&config),
            work_dir.path(),
        );
        let result = pipeline.run(&artifacts).await?;

        let exporter = OutputExporter::from_config(&runner, &config.export);
        let exported = exporter.export(&result).await;

        match cli.format {
            OutputFormat::Json => {
                let values: serde_json::Map<String, serde_json::Value> = exported
                    .iter()
                    .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.clone())))
                    .collect();
                let json = serde_json::json!({
                    "artifacts": outputs_json(&result),
                    "exported": values,
                });
                println!("{}", serde_json::to_string_pretty(&json)?);
            }
            OutputFormat::Text if !cli.quiet => {
                for artifact in result.outputs() {
                    output::success(&format!(
                        "{} {}",
                        artifact.artifact_type(),
                        output::path_style().apply_to(artifact.path().display())
                    ));
                }
                if !exporter.is_enabled() {
                    output::warning("No export target configured, produced paths were not exported");
                }
                for (key, value) in &exported {
                    println!("{}", output::key_value(key, value));
                }
            }
            OutputFormat::Text => {}
        }

        Ok(())
    }
}

fn outputs_json(result: &PipelineResult) -> Vec<serde_json::Value> {
    result
        .outputs()
        .iter()
        .map(|a| {
            serde_json::json!({
                "type": a.artifact_type().to_string(),
                "path": a.path().display().to_string(),
            })
        })
        .collect()
}

/// Configuration lines safe to print
pub fn config_summary(config: &ResignConfig) -> Vec<(&'static str, String)> {
    let mut lines = Vec::new();
    let artifacts = config
        .inputs
        .artifacts
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    lines.push(("artifacts", artifacts));

    let signature_type = config.signature_type();
    lines.push((
        "signature type",
        signature_type.map(|t| t.to_string()).unwrap_or_else(|| "-".to_string()),
    ));

    match signature_type {
        Some(SignatureType::Keystore) => {
            let url = config.keystore.url.as_deref().unwrap_or_default();
            let shown = match KeystoreSource::parse(url) {
                Ok(KeystoreSource::Remote(_)) => redact_url(url),
                _ => url.to_string(),
            };
            lines.push(("keystore", shown));
            lines.push(("keystore password", masked(config.keystore.password.as_deref())));
            lines.push(("alias", config.keystore.alias.clone().unwrap_or_default()));
            lines.push(("key password", masked(config.keystore.key_password.as_deref())));
        }
        Some(SignatureType::Certificate) => {
            let path = |p: &Option<PathBuf>| p.as_ref().map(|p| p.display().to_string()).unwrap_or_default();
            lines.push(("private key", path(&config.certificate.key_path)));
            lines.push(("certificate", path(&config.certificate.cert_path)));
        }
        Some(SignatureType::Pkcs11) => {
            lines.push(("provider arg", config.pkcs11.provider_arg.clone().unwrap_or_default()));
            lines.push(("pin", masked(config.pkcs11.pin.as_deref())));
        }
        None => {}
    }

    lines.push(("signer tool", config.signing.signer_tool.to_string()));
    lines.push(("signer scheme", config.signing.signer_scheme.to_string()));
    lines.push(("debuggable permitted", config.signing.debuggable_permitted.to_string()));
    lines.push(("page align", config.alignment.mode.to_string()));
    if let Some(name) = &config.output.name {
        lines.push(("output name", name.clone()));
    }
    if let Some(dir) = &config.output.directory {
        lines.push(("output directory", dir.display().to_string()));
    }
    lines
}
