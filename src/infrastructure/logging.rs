//! Logging configuration
//!
//! Initializes tracing for host diagnostics. Diagnostics go to stderr so
//! they never mix with the execution log the guest writes to stdout.

use std::sync::Once;

static INIT: Once = Once::new();

/// Initializes logging with the specified level; later calls are no-ops
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt};

    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(super::config::LOG_VAR)
            .unwrap_or_else(|_| EnvFilter::new(level));

        // another subscriber may already be installed by an embedding program
        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(true)
            .with_line_number(true)
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_twice() {
        init_logging("debug");
        init_logging("info");
    }
}
