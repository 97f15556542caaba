//! Logging initialization built on `env_logger`.
//!
//! Levels are configured via the `RUST_LOG` environment variable, e.g.
//! `RUST_LOG=info` for production or `RUST_LOG=lockbox_vault=debug` for
//! module-specific debugging.

use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Initialize the logging system (call once at application startup).
pub fn init() {
    INIT_LOGGER.call_once(|| {
        env_logger::Builder::from_default_env()
            .format_timestamp_micros()
            .init();
    });
}

/// Initialize logging for test environments.
///
/// Use this in test modules to avoid initialization conflicts.
pub fn init_test() {
    let _ = env_logger::Builder::from_default_env()
        .is_test(true)
        .try_init();
}
