//! Exit status and file logging of the `apk-resign` binary

use std::path::{Path, PathBuf};
use std::process::Command;

fn apk_resign_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_apk-resign"))
}

/// Everything written to the JSON log files under `home`
fn read_logs(home: &Path) -> String {
    let dir = home.join(".apk-resign").join("logs");
    let mut logs = String::new();
    for entry in std::fs::read_dir(&dir).unwrap() {
        logs.push_str(&std::fs::read_to_string(entry.unwrap().path()).unwrap());
    }
    logs
}

#[cfg(unix)]
#[test]
fn test_failed_run_exits_with_code_and_flushes_log() {
    let home = tempfile::tempdir().unwrap();
    let missing = home.path().join("missing.toml");

    let output = Command::new(apk_resign_bin())
        .env_clear()
        .env("HOME", home.path())
        .current_dir(home.path())
        .arg("run")
        .arg("--config")
        .arg(&missing)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing.toml"), "{stderr}");

    let logs = read_logs(home.path());
    assert!(logs.contains("executing run command"), "{logs}");
    assert!(logs.contains("command failed"), "{logs}");
}
