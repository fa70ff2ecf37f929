//! Common types and errors for FitSync
//!
//! This crate provides the error type, exit codes and logging setup shared
//! by the configuration loader and the `fitsync` binary.

pub mod telemetry;

use thiserror::Error;

/// Core error types for FitSync tooling
#[derive(Error, Debug)]
pub enum FitError {
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Invalid input: {0}")]
    ValidationError(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, FitError>;

/// Process exit codes used by the `fitsync` binary
pub const EXIT_ERROR: i32 = 1;
pub const EXIT_USAGE: i32 = 2;
pub const EXIT_CONFIG_ERROR: i32 = 101;

impl FitError {
    /// Map an error onto the exit code the CLI reports for it
    pub fn exit_code(&self) -> i32 {
        match self {
            FitError::ConfigError(_) => EXIT_CONFIG_ERROR,
            FitError::ValidationError(_) => EXIT_USAGE,
            _ => EXIT_ERROR,
        }
    }
}
