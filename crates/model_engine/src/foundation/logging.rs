//! Logging utilities
//!
//! The engine logs through the `log` facade. Applications call [`init`] once
//! at startup to install `env_logger` as the sink; `RUST_LOG` overrides the
//! default `info` level.

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system
///
/// Safe to call more than once; only the first call installs the logger.
pub fn init() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}
