use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use tempfile::TempDir;

/// Writes `source` to a fresh `.caps` file inside `dir` and returns its path.
pub fn write_source(dir: &TempDir, source: &str) -> PathBuf {
    let path = dir.path().join("program.caps");
    fs::write(&path, source).unwrap();
    path
}

/// Builds a `Command` for the `caps` binary against the given source text,
/// using a fresh temp directory that is dropped once the returned command's
/// assertion has been made.
pub fn caps_cmd_with_source(source: &str) -> (TempDir, Command) {
    let dir = TempDir::new().unwrap();
    let path = write_source(&dir, source);
    let mut cmd = Command::cargo_bin("caps").unwrap();
    cmd.arg(&path);
    (dir, cmd)
}
