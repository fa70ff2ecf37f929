//! Test logging configuration utilities
//!
//! Keeps tracing output out of test results unless asked for.

use std::sync::Once;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

static INIT: Once = Once::new();

/// Initialize tracing for tests with custom log level
///
/// Only the first call in a test process installs a subscriber; later calls
/// are ignored.
///
/// # Example
///
/// ```rust
/// use fit_test_helpers::logging::init_test_logging;
///
/// init_test_logging("debug");
/// ```
pub fn init_test_logging(level: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_test_writer()
            .finish();

        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

/// Suppress all logs below ERROR
pub fn suppress_logs() {
    init_test_logging("error");
}
