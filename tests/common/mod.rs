#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn run_snapverify(args: &[&str]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_snapverify"));
    command.env_remove("RUST_LOG");
    command.args(args);
    command.output().expect("failed to run snapverify binary")
}

pub fn run_snapverify_in(dir: &Path, args: &[&str]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_snapverify"));
    command.env_remove("RUST_LOG");
    command.current_dir(dir);
    command.args(args);
    command.output().expect("failed to run snapverify binary")
}

/// A temporary corpus directory holding the given fixture files.
pub fn corpus_with(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().expect("corpus tempdir should be created");
    for (name, content) in files {
        fs::write(dir.path().join(name), content).expect("fixture write should succeed");
    }
    dir
}

pub fn copy_fixture_into(dir: &Path, name: &str) -> PathBuf {
    let content = fs::read_to_string(fixture_path(name)).expect("fixture should be readable");
    let target = dir.join(name);
    fs::write(&target, content).expect("fixture copy should succeed");
    target
}

/// Writes a POSIX shell compiler that maps the exact JSON token payload on
/// stdin to canned CSS. Unknown payloads produce no output.
pub fn write_shell_compiler(dir: &Path, outputs: &[(&str, &str)]) -> PathBuf {
    let mut script = String::from("tokens=$(cat)\ncase \"$tokens\" in\n");
    for (payload, css) in outputs {
        script.push_str(&format!("  '{payload}') printf '%s\\n' '{css}' ;;\n"));
    }
    script.push_str("  *) ;;\nesac\n");

    let path = dir.join("compiler.sh");
    fs::write(&path, script).expect("compiler script write should succeed");
    path
}

pub fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be valid JSON")
}

pub fn path_str(path: &Path) -> &str {
    path.to_str().expect("path should be utf-8")
}
