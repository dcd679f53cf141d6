//! Export of the produced paths

use std::path::{Path, PathBuf};

use resign_core::config::ExportConfig;
use resign_core::{CommandRunner, ToolCommand};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::pipeline::PipelineResult;

pub const SIGNED_APK_PATH: &str = "SIGNED_APK_PATH";
pub const SIGNED_APK_PATH_LIST: &str = "SIGNED_APK_PATH_LIST";
pub const SIGNED_AAB_PATH: &str = "SIGNED_AAB_PATH";
pub const SIGNED_AAB_PATH_LIST: &str = "SIGNED_AAB_PATH_LIST";

/// Separator of the `*_LIST` values
pub const LIST_SEPARATOR: &str = "|";

/// Named values describing a run's outputs.
///
/// Keys for an artifact type are only present when the run produced at least
/// one artifact of that type. The single-path key holds the last one.
pub fn export_values(result: &PipelineResult) -> Vec<(&'static str, String)> {
    let mut values = Vec::new();
    let mut add = |paths: Vec<&Path>, single: &'static str, list: &'static str| {
        let Some(last) = paths.last() else {
            return;
        };
        values.push((single, last.display().to_string()));
        let joined = paths
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(LIST_SEPARATOR);
        values.push((list, joined));
    };
    add(result.apks(), SIGNED_APK_PATH, SIGNED_APK_PATH_LIST);
    add(result.aabs(), SIGNED_AAB_PATH, SIGNED_AAB_PATH_LIST);
    values
}

/// Publishes output values through `envman` and/or a `KEY=value` file.
///
/// Export never fails a run; problems are logged as warnings.
pub struct OutputExporter<'a> {
    runner: &'a dyn CommandRunner,
    envman: Option<PathBuf>,
    file: Option<PathBuf>,
}

impl<'a> OutputExporter<'a> {
    /// Exporter for `config`, looking `envman` up on `PATH` when enabled
    pub fn from_config(runner: &'a dyn CommandRunner, config: &ExportConfig) -> Self {
        let envman = if config.envman {
            match which::which("envman") {
                Ok(path) => Some(path),
                Err(_) => {
                    debug!("envman not found on PATH, skipping envman export");
                    None
                }
            }
        } else {
            None
        };
        Self::new(runner, envman, config.file.clone())
    }

    pub fn new(runner: &'a dyn CommandRunner, envman: Option<PathBuf>, file: Option<PathBuf>) -> Self {
        Self {
            runner,
            envman,
            file,
        }
    }

    /// Whether any export target is configured
    pub fn is_enabled(&self) -> bool {
        self.envman.is_some() || self.file.is_some()
    }

    /// Export every value of `result`, returning the values exported
    pub async fn export(&self, result: &PipelineResult) -> Vec<(&'static str, String)> {
        let values = export_values(result);
        for (key, value) in &values {
            if let Some(envman) = &self.envman {
                self.envman_add(envman, key, value).await;
            }
        }
        if let Some(file) = &self.file {
            if let Err(err) = append_lines(file, &values).await {
                warn!(file = %file.display(), error = %err, "failed to write export file");
            }
        }
        values
    }

    async fn envman_add(&self, envman: &Path, key: &str, value: &str) {
        let cmd = ToolCommand::new(envman)
            .args(["add", "--key", key])
            .stdin(value);
        match self.runner.run(&cmd).await {
            Ok(output) if output.is_success() => info!(%key, %value, "exported"),
            Ok(output) => warn!(%key, output = %output.trimmed(), "envman export failed"),
            Err(err) => warn!(%key, error = %err, "envman export failed"),
        }
    }
}

async fn append_lines(file: &Path, values: &[(&'static str, String)]) -> std::io::Result<()> {
    if let Some(parent) = file.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut handle = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(file)
        .await?;
    let mut content = String::new();
    for (key, value) in values {
        content.push_str(&format!("{key}={value}\n"));
    }
    handle.write_all(content.as_bytes()).await?;
    handle.flush().await?;
    info!(file = %file.display(), values = values.len(), "wrote export file");
    Ok(())
}
