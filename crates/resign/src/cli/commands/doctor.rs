//! Doctor command - check the Android SDK and JDK tools

use std::path::{Path, PathBuf};

use clap::Args;
use console::style;
use serde::Serialize;
use tracing::info;

use resign_core::{find_jdk_tool, AndroidSdk, ConfigError};

use crate::cli::{Cli, OutputFormat};

/// Check the Android SDK and JDK tools
#[derive(Debug, Args)]
pub struct DoctorCommand {
    /// Show suggestions for fixing issues
    #[arg(long)]
    pub fix: bool,
}

/// Result of a single check
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: Option<String>,
    pub fix_suggestion: Option<String>,
}

impl CheckResult {
    fn ok(name: &str, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: Some(message.into()),
            fix_suggestion: None,
        }
    }

    fn problem(name: &str, status: CheckStatus, message: impl Into<String>, fix: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: Some(message.into()),
            fix_suggestion: Some(fix.into()),
        }
    }
}

/// Status of a check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Ok,
    Warn,
    Fail,
    Skip,
}

/// Summary of all checks
#[derive(Debug, Serialize)]
pub struct DoctorSummary {
    pub checks: Vec<CheckResult>,
    pub ok_count: usize,
    pub warn_count: usize,
    pub fail_count: usize,
}

impl DoctorSummary {
    fn new(checks: Vec<CheckResult>) -> Self {
        let count = |status| checks.iter().filter(|c| c.status == status).count();
        let (ok_count, warn_count, fail_count) =
            (count(CheckStatus::Ok), count(CheckStatus::Warn), count(CheckStatus::Fail));
        Self {
            checks,
            ok_count,
            warn_count,
            fail_count,
        }
    }
}

/// Android SDK checks: SDK root, build-tools and the tools the pipeline runs
pub fn check_sdk(sdk: Result<AndroidSdk, ConfigError>) -> Vec<CheckResult> {
    let sdk = match sdk {
        Ok(sdk) => sdk,
        Err(err) => {
            return vec![CheckResult::problem(
                "Android SDK",
                CheckStatus::Fail,
                err.to_string(),
                "Set ANDROID_HOME to your Android SDK location",
            )]
        }
    };

    let mut results = vec![CheckResult::ok("Android SDK", sdk.root().display().to_string())];
    let build_tools = match sdk.latest_build_tools() {
        Ok(dir) => dir,
        Err(err) => {
            results.push(CheckResult::problem(
                "build-tools",
                CheckStatus::Fail,
                err.to_string(),
                "Run 'sdkmanager \"build-tools;34.0.0\"'",
            ));
            return results;
        }
    };
    let version = build_tools
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    results.push(CheckResult::ok("build-tools", version));

    for (tool, required) in [("aapt", true), ("zipalign", true), ("apksigner", false)] {
        results.push(match sdk.build_tool(tool) {
            Ok(path) => CheckResult::ok(tool, path.display().to_string()),
            Err(_) if required => CheckResult::problem(
                tool,
                CheckStatus::Fail,
                "Not found in build-tools",
                "Reinstall the build-tools package",
            ),
            Err(_) => CheckResult::problem(
                tool,
                CheckStatus::Warn,
                "Not found, APKs will be signed with jarsigner",
                "Install build-tools 24.0.3 or newer",
            ),
        });
    }
    results
}

/// JDK checks for keytool and jarsigner
pub fn check_jdk(java_home: Option<&Path>) -> Vec<CheckResult> {
    let mut results = Vec::new();
    match java_home {
        Some(home) => results.push(CheckResult::ok("JAVA_HOME", home.display().to_string())),
        None => results.push(CheckResult::problem(
            "JAVA_HOME",
            CheckStatus::Warn,
            "Not set, falling back to PATH",
            "Set JAVA_HOME to a JDK installation",
        )),
    }

    for tool in ["keytool", "jarsigner"] {
        results.push(match find_jdk_tool(java_home, tool) {
            Some(path) => CheckResult::ok(tool, path.display().to_string()),
            None => CheckResult::problem(
                tool,
                CheckStatus::Fail,
                "Not found",
                "Install a JDK and set JAVA_HOME",
            ),
        });
    }
    results
}

fn check_envman(envman: Option<PathBuf>) -> CheckResult {
    match envman {
        Some(path) => CheckResult::ok("envman", path.display().to_string()),
        None => CheckResult {
            name: "envman".to_string(),
            status: CheckStatus::Skip,
            message: Some("Not installed, use --export-file to export outputs".to_string()),
            fix_suggestion: None,
        },
    }
}

impl DoctorCommand {
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(fix = self.fix, "executing doctor command");

        if cli.prints_text() {
            println!("{}", style("Checking environment...").bold());
            println!();
        }

        let java_home = std::env::var_os("JAVA_HOME").map(PathBuf::from);
        let mut checks = check_sdk(AndroidSdk::from_env());
        checks.extend(check_jdk(java_home.as_deref()));
        checks.push(check_envman(which::which("envman").ok()));
        let summary = DoctorSummary::new(checks);

        match cli.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
            OutputFormat::Text if !cli.quiet => self.print(&summary),
            OutputFormat::Text => {}
        }

        if summary.fail_count > 0 {
            anyhow::bail!("{} check(s) failed", summary.fail_count);
        }
        Ok(())
    }

    fn print(&self, summary: &DoctorSummary) {
        for check in &summary.checks {
            let name = match check.status {
                CheckStatus::Ok => style(check.name.as_str()).green(),
                CheckStatus::Warn => style(check.name.as_str()).yellow(),
                CheckStatus::Fail => style(check.name.as_str()).red(),
                CheckStatus::Skip => style(check.name.as_str()).dim(),
            };
            let msg = check.message.as_deref().unwrap_or("");
            println!("  {} {} {}", status_icon(check.status), name, style(msg).dim());
        }

        println!();
        if summary.fail_count == 0 && summary.warn_count == 0 {
            println!("{} All {} checks passed!", style("✓").green().bold(), summary.ok_count);
        } else {
            println!(
                "Summary: {} ok, {} warnings, {} failed",
                style(summary.ok_count).green(),
                style(summary.warn_count).yellow(),
                style(summary.fail_count).red(),
            );
        }

        if self.fix {
            let fixes: Vec<_> = summary
                .checks
                .iter()
                .filter_map(|c| c.fix_suggestion.as_ref().map(|fix| (c, fix)))
                .collect();
            if !fixes.is_empty() {
                println!();
                println!("{}", style("Suggested fixes:").bold());
                for (check, fix) in fixes {
                    println!("  {} {}: {}", status_icon(check.status), style(&check.name).bold(), fix);
                }
            }
        }
    }
}

fn status_icon(status: CheckStatus) -> console::StyledObject<&'static str> {
    match status {
        CheckStatus::Ok => style("[OK]").green(),
        CheckStatus::Warn => style("[WARN]").yellow(),
        CheckStatus::Fail => style("[FAIL]").red(),
        CheckStatus::Skip => style("[SKIP]").dim(),
    }
}
