//! Configuration loading

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::ConfigError;

use super::defaults::config_file_names;
use super::types::ResignConfig;

/// Load configuration from a file.
///
/// The file may be partial; validation runs once command-line overrides have
/// been applied (see [`super::validate_config`]).
pub fn load_config(path: &Path) -> Result<ResignConfig, ConfigError> {
    let format = if path.extension().is_some_and(|e| e == "toml") {
        "TOML"
    } else {
        "YAML"
    };
    info!(path = %path.display(), format, "loading config");

    if !path.is_file() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)?;

    let config: ResignConfig = if format == "TOML" {
        toml::from_str(&content)?
    } else {
        serde_yaml::from_str(&content)?
    };

    debug!(path = %path.display(), "config loaded");
    Ok(config)
}

/// Find configuration file in directory or parent directories.
///
/// The first name from [`config_file_names`] found while walking up from
/// `start_dir` wins.
pub fn find_config(start_dir: &Path) -> Option<PathBuf> {
    debug!(start_dir = %start_dir.display(), "searching for config file");
    let mut current = start_dir.to_path_buf();

    loop {
        for name in config_file_names() {
            let config_path = current.join(name);
            if config_path.exists() {
                info!(path = %config_path.display(), "found config file");
                return Some(config_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    debug!("no config file found");
    None
}

/// Load the configuration found from `dir`, or defaults when there is none.
///
/// A config file that exists but cannot be parsed is an error rather than a
/// silent fallback.
pub fn load_config_or_default(dir: &Path) -> Result<(ResignConfig, Option<PathBuf>), ConfigError> {
    match find_config(dir) {
        Some(path) => {
            let config = load_config(&path)?;
            Ok((config, Some(path)))
        }
        None => {
            debug!(dir = %dir.display(), "no config found, using defaults");
            Ok((ResignConfig::default(), None))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AlignmentMode, SignerTool};
    use tempfile::TempDir;

    #[test]
    fn test_find_config_toml() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("apk-resign.toml");
        std::fs::write(&config_path, "[alignment]\nmode = \"automatic\"").unwrap();

        let found = find_config(temp.path());
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_find_config_prefers_toml_over_yaml() {
        let temp = TempDir::new().unwrap();
        let toml_path = temp.path().join("apk-resign.toml");
        let yaml_path = temp.path().join("apk-resign.yaml");
        std::fs::write(&toml_path, "[alignment]\nmode = \"true\"").unwrap();
        std::fs::write(&yaml_path, "alignment:\n  mode: \"false\"").unwrap();

        let found = find_config(temp.path()).unwrap();
        assert_eq!(found, toml_path);
    }

    #[test]
    fn test_find_config_in_parent_dir() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("app").join("build");
        std::fs::create_dir_all(&nested).unwrap();
        let config_path = temp.path().join(".apk-resign.yaml");
        std::fs::write(&config_path, "signing:\n  signer_tool: jarsigner\n").unwrap();

        assert_eq!(find_config(&nested), Some(config_path));
    }

    #[test]
    fn test_load_config_toml() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("apk-resign.toml");
        std::fs::write(
            &config_path,
            "[signing]\nsigner_tool = \"apksigner\"\n\n[alignment]\nmode = \"true\"\n",
        )
        .unwrap();

        let config = load_config(&config_path).unwrap();
        assert_eq!(config.signing.signer_tool, SignerTool::Apksigner);
        assert_eq!(config.alignment.mode, AlignmentMode::ForcePageAligned);
    }

    #[test]
    fn test_load_config_rejects_unknown_enum() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("apk-resign.yaml");
        std::fs::write(&config_path, "signing:\n  signer_tool: signtool\n").unwrap();

        assert!(matches!(
            load_config(&config_path),
            Err(ConfigError::YamlError(_))
        ));
    }

    #[test]
    fn test_load_missing_config() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("apk-resign.toml");
        assert!(matches!(load_config(&missing), Err(ConfigError::NotFound(p)) if p == missing));
    }

    #[test]
    fn test_load_config_or_default_without_file() {
        let temp = TempDir::new().unwrap();
        let (config, path) = load_config_or_default(temp.path()).unwrap();
        assert!(path.is_none());
        assert!(config.inputs.artifacts.is_empty());
    }
}
