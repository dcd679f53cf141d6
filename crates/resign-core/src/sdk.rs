//! Android SDK and JDK tool discovery

use std::path::{Path, PathBuf};

use semver::Version;
use tracing::{debug, info};

use crate::error::ConfigError;

/// An Android SDK installation
#[derive(Debug, Clone)]
pub struct AndroidSdk {
    root: PathBuf,
}

impl AndroidSdk {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Locate the SDK from `ANDROID_HOME`, then `ANDROID_SDK_ROOT`
    pub fn from_env() -> Result<Self, ConfigError> {
        ["ANDROID_HOME", "ANDROID_SDK_ROOT"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|value| !value.is_empty())
            .map(Self::new)
            .ok_or_else(|| ConfigError::ToolNotFound {
                tool: "Android SDK".to_string(),
                hint: "Set ANDROID_HOME or ANDROID_SDK_ROOT".to_string(),
            })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Highest `build-tools/<version>` directory.
    ///
    /// Directory names that are not versions are skipped.
    pub fn latest_build_tools(&self) -> Result<PathBuf, ConfigError> {
        let build_tools = self.root.join("build-tools");
        let not_found = || ConfigError::ToolNotFound {
            tool: "build-tools".to_string(),
            hint: format!(
                "No build-tools found in {}, install them with sdkmanager",
                build_tools.display()
            ),
        };

        let entries = std::fs::read_dir(&build_tools).map_err(|_| not_found())?;

        let mut latest: Option<(Version, PathBuf)> = None;
        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            let version = match parse_build_tools_version(&name) {
                Some(v) => v,
                None => {
                    debug!(dir = %name, "skipping non-version build-tools entry");
                    continue;
                }
            };
            if latest.as_ref().map_or(true, |(best, _)| version > *best) {
                latest = Some((version, path));
            }
        }

        let (version, path) = latest.ok_or_else(not_found)?;
        debug!(%version, "using build-tools");
        Ok(path)
    }

    /// Path of a tool in the latest build-tools
    pub fn build_tool(&self, name: &str) -> Result<PathBuf, ConfigError> {
        let dir = self.latest_build_tools()?;
        find_executable(&dir, name).ok_or_else(|| ConfigError::ToolNotFound {
            tool: name.to_string(),
            hint: format!("Expected it in {}", dir.display()),
        })
    }
}

/// Build-tools directories are usually `34.0.0`, sometimes `30.0.0-rc1` or `29`
fn parse_build_tools_version(name: &str) -> Option<Version> {
    if let Ok(v) = Version::parse(name) {
        return Some(v);
    }
    let mut parts = name.split('.').map(|p| p.parse::<u64>());
    let major = parts.next()?.ok()?;
    let minor = parts.next().unwrap_or(Ok(0)).ok()?;
    let patch = parts.next().unwrap_or(Ok(0)).ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(Version::new(major, minor, patch))
}

fn find_executable(dir: &Path, name: &str) -> Option<PathBuf> {
    let candidates: &[&str] = if cfg!(windows) {
        &["", ".exe", ".bat"]
    } else {
        &[""]
    };
    candidates
        .iter()
        .map(|ext| dir.join(format!("{name}{ext}")))
        .find(|p| p.is_file())
}

/// Resolved locations of every external tool the pipeline drives
#[derive(Debug, Clone)]
pub struct ToolPaths {
    pub aapt: PathBuf,
    pub zipalign: PathBuf,
    pub apksigner: Option<PathBuf>,
    pub keytool: Option<PathBuf>,
    pub jarsigner: Option<PathBuf>,
}

impl ToolPaths {
    /// Discover tools from the environment
    pub fn discover() -> Result<Self, ConfigError> {
        let sdk = AndroidSdk::from_env()?;
        let java_home = std::env::var_os("JAVA_HOME").map(PathBuf::from);
        Self::discover_in(&sdk, java_home.as_deref())
    }

    /// Discover tools in an explicit SDK, with JDK tools from `java_home/bin`
    /// or `PATH`
    pub fn discover_in(sdk: &AndroidSdk, java_home: Option<&Path>) -> Result<Self, ConfigError> {
        let build_tools = sdk.latest_build_tools()?;
        let required = |name: &str| {
            find_executable(&build_tools, name).ok_or_else(|| ConfigError::ToolNotFound {
                tool: name.to_string(),
                hint: format!("Expected it in {}", build_tools.display()),
            })
        };

        let paths = Self {
            aapt: required("aapt")?,
            zipalign: required("zipalign")?,
            apksigner: find_executable(&build_tools, "apksigner"),
            keytool: find_jdk_tool(java_home, "keytool"),
            jarsigner: find_jdk_tool(java_home, "jarsigner"),
        };
        info!(build_tools = %build_tools.display(), "resolved Android build-tools");
        debug!(?paths, "tool paths");
        Ok(paths)
    }

    pub fn keytool(&self) -> Result<&Path, ConfigError> {
        self.keytool.as_deref().ok_or_else(|| jdk_missing("keytool"))
    }

    pub fn jarsigner(&self) -> Result<&Path, ConfigError> {
        self.jarsigner.as_deref().ok_or_else(|| jdk_missing("jarsigner"))
    }

    pub fn apksigner(&self) -> Result<&Path, ConfigError> {
        self.apksigner
            .as_deref()
            .ok_or_else(|| ConfigError::ToolNotFound {
                tool: "apksigner".to_string(),
                hint: "Install Android SDK build-tools 24.0.3 or newer".to_string(),
            })
    }
}

fn jdk_missing(tool: &str) -> ConfigError {
    ConfigError::ToolNotFound {
        tool: tool.to_string(),
        hint: "Install a JDK and set JAVA_HOME or add it to PATH".to_string(),
    }
}

/// A JDK tool from `java_home/bin`, else from `PATH`
pub fn find_jdk_tool(java_home: Option<&Path>, name: &str) -> Option<PathBuf> {
    java_home
        .and_then(|home| find_executable(&home.join("bin"), name))
        .or_else(|| which::which(name).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"#!/bin/sh\n").unwrap();
    }

    #[test]
    fn test_parse_build_tools_version() {
        assert_eq!(parse_build_tools_version("34.0.0"), Some(Version::new(34, 0, 0)));
        assert_eq!(parse_build_tools_version("29"), Some(Version::new(29, 0, 0)));
        assert!(parse_build_tools_version("30.0.0-rc1").is_some());
        assert_eq!(parse_build_tools_version("debian"), None);
    }

    #[test]
    fn test_latest_build_tools_uses_semver_order() {
        let temp = TempDir::new().unwrap();
        for version in ["9.0.0", "28.0.3", "30.0.2", "debian"] {
            std::fs::create_dir_all(temp.path().join("build-tools").join(version)).unwrap();
        }

        let sdk = AndroidSdk::new(temp.path());
        let latest = sdk.latest_build_tools().unwrap();
        assert_eq!(latest, temp.path().join("build-tools").join("30.0.2"));
    }

    #[test]
    fn test_latest_build_tools_missing() {
        let temp = TempDir::new().unwrap();
        let sdk = AndroidSdk::new(temp.path());
        assert!(matches!(
            sdk.latest_build_tools(),
            Err(ConfigError::ToolNotFound { .. })
        ));
    }

    #[test]
    fn test_discover_tools() {
        let temp = TempDir::new().unwrap();
        let tools = temp.path().join("sdk/build-tools/34.0.0");
        touch(&tools.join("aapt"));
        touch(&tools.join("zipalign"));
        let jdk = temp.path().join("jdk");
        touch(&jdk.join("bin/keytool"));
        touch(&jdk.join("bin/jarsigner"));

        let sdk = AndroidSdk::new(temp.path().join("sdk"));
        let paths = ToolPaths::discover_in(&sdk, Some(&jdk)).unwrap();
        assert_eq!(paths.zipalign, tools.join("zipalign"));
        assert!(paths.apksigner.is_none());
        assert!(paths.apksigner().is_err());
        assert_eq!(paths.keytool().unwrap(), jdk.join("bin/keytool"));
    }

    #[test]
    fn test_discover_requires_zipalign() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join("build-tools/34.0.0/aapt"));

        let sdk = AndroidSdk::new(temp.path());
        let err = ToolPaths::discover_in(&sdk, None).unwrap_err();
        assert!(matches!(err, ConfigError::ToolNotFound { tool, .. } if tool == "zipalign"));
    }
}
