//! Workspace initialization utilities for tests

use assert_fs::TempDir;
use std::fs;

/// Create a temporary directory for testing
///
/// The directory is removed when the `TempDir` is dropped.
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}

/// Initialize a FitSync workspace in a temp directory
///
/// Creates `.fitsync/` and the default store directory inside it.
///
/// # Example
///
/// ```rust
/// use fit_test_helpers::workspace::init_workspace;
///
/// let workspace = init_workspace();
/// assert!(workspace.path().join(".fitsync/store").exists());
/// ```
pub fn init_workspace() -> TempDir {
    let temp = temp_dir();
    fs::create_dir_all(temp.path().join(".fitsync/store"))
        .expect("Failed to create .fitsync/store directory");
    temp
}

/// Create a workspace whose `.fitsync/config.toml` holds `config`
pub fn workspace_with_config(config: &str) -> TempDir {
    let workspace = init_workspace();
    fs::write(workspace.path().join(".fitsync/config.toml"), config)
        .expect("Failed to write config.toml");
    workspace
}
