//! CLI command builders for tests

use assert_cmd::Command;

/// Get a Command for the `fitsync` binary with clean environment
///
/// `RUST_LOG=error` keeps INFO/DEBUG output out of assertions on stderr.
#[allow(deprecated)]
pub fn fitsync_command() -> Command {
    let mut cmd = Command::cargo_bin("fitsync").expect("Failed to find fitsync binary");
    cmd.env("RUST_LOG", "error");
    cmd
}
