//! Shared test utilities for FitSync test suites
//!
//! # Modules
//!
//! - [`workspace`]: Temporary workspace setup
//! - [`cli`]: Command builders with pre-configured environments
//! - [`logging`]: Test logging configuration
//! - [`assertions`]: Domain-specific assertion helpers
//!
//! # Example
//!
//! ```rust,no_run
//! use fit_test_helpers::prelude::*;
//!
//! let workspace = init_workspace();
//! fitsync_command()
//!     .arg("--root")
//!     .arg(workspace.path())
//!     .arg("status")
//!     .assert()
//!     .success();
//! ```

pub mod assertions;
pub mod cli;
pub mod logging;
pub mod workspace;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::assertions::*;
    pub use crate::cli::fitsync_command;
    pub use crate::logging::{init_test_logging, suppress_logs};
    pub use crate::workspace::{init_workspace, temp_dir, workspace_with_config};
}
