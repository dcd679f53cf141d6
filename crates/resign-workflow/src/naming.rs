//! Output file naming

use std::path::{Path, PathBuf};

use resign_core::Artifact;

/// Suffix stripped from input names
pub const UNSIGNED_SUFFIX: &str = "-unsigned";

/// Suffix added to produced files when no output name is configured
pub const SIGNED_SUFFIX: &str = "-signed";

/// File stem with a trailing `-unsigned` removed.
///
/// `app-unsigned.apk` becomes `app`; `app-signed.apk` stays `app-signed`.
pub fn pretty_basename(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    match stem.strip_suffix(UNSIGNED_SUFFIX) {
        Some(base) if !base.is_empty() => base.to_string(),
        _ => stem,
    }
}

/// Where the signed copy of `artifact` goes.
///
/// `index` is the artifact's position in the run; it only matters when an
/// explicit output name is shared by several artifacts.
pub fn output_path(
    artifact: &Artifact,
    index: usize,
    output_name: Option<&str>,
    output_dir: Option<&Path>,
) -> PathBuf {
    let dir = match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => artifact
            .path()
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    let ext = artifact.extension();

    let file_name = match output_name {
        Some(name) if index == 0 => format!("{name}{ext}"),
        Some(name) => format!("{name}-{index}{ext}"),
        None => format!("{}{SIGNED_SUFFIX}{ext}", pretty_basename(artifact.path())),
    };
    dir.join(file_name)
}

/// `path` with `-<index>` added before the extension
pub fn indexed_path(path: &Path, index: usize) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    path.with_file_name(format!("{stem}-{index}{ext}"))
}

/// Per-artifact working directory name inside the run's temp directory
pub fn work_dir_name(index: usize, artifact: &Artifact) -> String {
    format!("{index}-{}", pretty_basename(artifact.path()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pretty_basename() {
        assert_eq!(pretty_basename(Path::new("app-unsigned.apk")), "app");
        assert_eq!(pretty_basename(Path::new("app-signed.apk")), "app-signed");
        assert_eq!(pretty_basename(Path::new("app-debug.apk")), "app-debug");
        assert_eq!(pretty_basename(Path::new("out/app-release-unsigned.aab")), "app-release");
        assert_eq!(pretty_basename(Path::new("-unsigned.apk")), "-unsigned");
    }

    #[test]
    fn test_default_output_path() {
        let artifact = Artifact::new("build/outputs/app-release-unsigned.APK").unwrap();
        assert_eq!(
            output_path(&artifact, 0, None, None),
            PathBuf::from("build/outputs/app-release-signed.APK")
        );

        let bare = Artifact::new("app.aab").unwrap();
        assert_eq!(output_path(&bare, 3, None, None), PathBuf::from("./app-signed.aab"));
    }

    #[test]
    fn test_named_output_path() {
        let first = Artifact::new("a/app.apk").unwrap();
        let second = Artifact::new("a/app.aab").unwrap();
        let dir = Path::new("/dist");

        assert_eq!(output_path(&first, 0, Some("release"), Some(dir)), PathBuf::from("/dist/release.apk"));
        assert_eq!(output_path(&second, 1, Some("release"), Some(dir)), PathBuf::from("/dist/release-1.aab"));
    }

    #[test]
    fn test_indexed_path() {
        assert_eq!(
            indexed_path(Path::new("/dist/app-release-signed.apk"), 1),
            PathBuf::from("/dist/app-release-signed-1.apk")
        );
        assert_eq!(indexed_path(Path::new("out/app"), 2), PathBuf::from("out/app-2"));
    }

    #[test]
    fn test_work_dir_name() {
        let artifact = Artifact::new("x/app-unsigned.apk").unwrap();
        assert_eq!(work_dir_name(2, &artifact), "2-app");
    }
}
