//! Where the keystore comes from

use std::path::{Path, PathBuf};

use tracing::info;
use url::Url;

use crate::error::{PipelineError, Result};

/// File name of a downloaded keystore inside the working directory
pub const DOWNLOADED_KEYSTORE: &str = "keystore.jks";

const FILE_SCHEME: &str = "file://";

/// A keystore location as configured
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeystoreSource {
    /// Path on the local filesystem
    Local(PathBuf),
    /// http(s) URL to download
    Remote(Url),
}

impl KeystoreSource {
    /// `file://` and plain values are local paths; http(s) URLs are remote
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if let Some(path) = raw.strip_prefix(FILE_SCHEME) {
            let path = PathBuf::from(path);
            let path = if path.is_absolute() {
                path
            } else {
                std::env::current_dir()?.join(path)
            };
            return Ok(Self::Local(path));
        }

        let lower = raw.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            let url = Url::parse(raw).map_err(|e| PipelineError::KeystoreDownload {
                url: redact_url(raw),
                reason: e.to_string(),
            })?;
            return Ok(Self::Remote(url));
        }

        Ok(Self::Local(PathBuf::from(raw)))
    }

    /// Local path of the keystore, downloading it into `work_dir` if needed
    pub async fn resolve(&self, work_dir: &Path) -> Result<PathBuf> {
        match self {
            Self::Local(path) => Ok(path.clone()),
            Self::Remote(url) => {
                let destination = work_dir.join(DOWNLOADED_KEYSTORE);
                download(url, &destination).await?;
                Ok(destination)
            }
        }
    }
}

async fn download(url: &Url, destination: &Path) -> Result<()> {
    let shown = redact_url(url.as_str());
    info!(url = %shown, "downloading keystore");
    let failed = |reason: String| PipelineError::KeystoreDownload {
        url: shown.clone(),
        reason,
    };

    let response = reqwest::get(url.clone())
        .await
        .map_err(|e| failed(e.without_url().to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(failed(format!("server responded with {status}")));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| failed(e.without_url().to_string()))?;
    tokio::fs::write(destination, &bytes).await?;
    Ok(())
}

/// Scheme and host only; paths and query strings may carry tokens
pub fn redact_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(url) => match url.host_str() {
            Some(host) => format!("{}://{}/***", url.scheme(), host),
            None => format!("{}://***", url.scheme()),
        },
        Err(_) => "***".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_sources() {
        assert_eq!(
            KeystoreSource::parse("file:///keys/release.jks").unwrap(),
            KeystoreSource::Local(PathBuf::from("/keys/release.jks"))
        );
        assert_eq!(
            KeystoreSource::parse("keys/release.jks").unwrap(),
            KeystoreSource::Local(PathBuf::from("keys/release.jks"))
        );
        assert!(matches!(
            KeystoreSource::parse("https://example.com/release.jks?token=abc").unwrap(),
            KeystoreSource::Remote(_)
        ));
    }

    #[test]
    fn test_relative_file_url_is_made_absolute() {
        match KeystoreSource::parse("file://keys/release.jks").unwrap() {
            KeystoreSource::Local(path) => {
                assert!(path.is_absolute());
                assert!(path.ends_with("keys/release.jks"));
            }
            other => panic!("unexpected source: {other:?}"),
        }
    }

    #[test]
    fn test_redact_url() {
        assert_eq!(
            redact_url("https://user:pw@example.com/k/release.jks?token=abc"),
            "https://example.com/***"
        );
        assert_eq!(redact_url("not a url"), "***");
    }

    #[tokio::test]
    async fn test_resolve_local() {
        let temp = TempDir::new().unwrap();
        let source = KeystoreSource::Local(PathBuf::from("/keys/release.jks"));
        assert_eq!(
            source.resolve(temp.path()).await.unwrap(),
            PathBuf::from("/keys/release.jks")
        );
        assert!(!temp.path().join(DOWNLOADED_KEYSTORE).exists());
    }
}
