//! Exit codes for the CLI

use resign_core::ConfigError;
use resign_package::{ManifestParseError, PackageError};
use resign_signing::SigningError;
use resign_workflow::PipelineError;

/// General error
pub const ERROR: u8 = 1;

/// Configuration error
pub const CONFIG_ERROR: u8 = 2;

/// Keystore could not be fetched or read
pub const KEYSTORE_ERROR: u8 = 3;

/// Signing or verification failed
pub const SIGNING_ERROR: u8 = 4;

/// Unsigning or alignment failed
pub const PACKAGE_ERROR: u8 = 5;

/// User cancelled
pub const CANCELLED: u8 = 130;

/// The run was interrupted
#[derive(Debug)]
pub struct Cancelled;

impl std::fmt::Display for Cancelled {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Cancelled")
    }
}

impl std::error::Error for Cancelled {}

fn for_signing(err: &SigningError) -> u8 {
    match err {
        SigningError::KeystoreRead { .. } | SigningError::UnsupportedAlgorithm(_) => KEYSTORE_ERROR,
        SigningError::InvalidConfiguration(_) | SigningError::Config(_) => CONFIG_ERROR,
        SigningError::SignFailed { .. } | SigningError::VerificationFailed { .. } => SIGNING_ERROR,
        SigningError::Tool(_) | SigningError::Io(_) => ERROR,
    }
}

fn for_pipeline(err: &PipelineError) -> u8 {
    match err {
        PipelineError::Config(_) => CONFIG_ERROR,
        PipelineError::KeystoreDownload { .. } => KEYSTORE_ERROR,
        PipelineError::Signing(err) => for_signing(err),
        PipelineError::Package(PackageError::Tool(_) | PackageError::Io(_)) => ERROR,
        PipelineError::Package(_) | PipelineError::Manifest(_) => PACKAGE_ERROR,
        PipelineError::Tool(_) | PipelineError::Io(_) => ERROR,
    }
}

/// Exit code for an error returned by a command
pub fn for_error(err: &anyhow::Error) -> u8 {
    for cause in err.chain() {
        if cause.is::<Cancelled>() {
            return CANCELLED;
        }
        if let Some(err) = cause.downcast_ref::<PipelineError>() {
            return for_pipeline(err);
        }
        if let Some(err) = cause.downcast_ref::<SigningError>() {
            return for_signing(err);
        }
        if cause.is::<ConfigError>() {
            return CONFIG_ERROR;
        }
        if cause.is::<PackageError>() || cause.is::<ManifestParseError>() {
            return PACKAGE_ERROR;
        }
    }
    ERROR
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_pipeline_error_codes() {
        let config: anyhow::Error = PipelineError::Config(ConfigError::MissingField("keystore.url".into())).into();
        assert_eq!(for_error(&config), CONFIG_ERROR);

        let download: anyhow::Error = PipelineError::KeystoreDownload {
            url: "https://example.com/***".into(),
            reason: "server responded with 404 Not Found".into(),
        }
        .into();
        assert_eq!(for_error(&download), KEYSTORE_ERROR);

        let verify: anyhow::Error = PipelineError::Signing(SigningError::VerificationFailed {
            path: PathBuf::from("signed.apk"),
            output: "jar is unsigned.".into(),
        })
        .into();
        assert_eq!(for_error(&verify), SIGNING_ERROR);

        let align: anyhow::Error = PipelineError::Package(PackageError::Alignment {
            path: PathBuf::from("signed.apk"),
            output: String::new(),
        })
        .into();
        assert_eq!(for_error(&align), PACKAGE_ERROR);
    }

    #[test]
    fn test_context_and_plain_errors() {
        let wrapped = anyhow::Error::new(ConfigError::ArtifactNotFound("app.apk".into())).context("loading inputs");
        assert_eq!(for_error(&wrapped), CONFIG_ERROR);
        assert_eq!(for_error(&anyhow::Error::new(Cancelled)), CANCELLED);
        assert_eq!(for_error(&anyhow::anyhow!("boom")), ERROR);
    }
}
