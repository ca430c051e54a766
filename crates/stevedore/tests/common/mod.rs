//! Common test utilities shared across integration tests.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

/// Run the stevedore binary in the specified directory with colors disabled
pub fn run_stevedore_in_dir(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_stevedore"))
        .args(args)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute stevedore binary")
}

/// Write a file into the test directory
pub fn write_file(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).expect("Failed to write test file");
}

/// Stdout of a finished run as text
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Stderr of a finished run as text
pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
