//! Logging utilities
//!
//! The engine logs exclusively through the `log` facade. Binaries and tests
//! pick a backend; [`init_with_filter`] wires up `env_logger`, honouring
//! `RUST_LOG`.

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system with a default filter
///
/// `RUST_LOG` still takes precedence when it is set. Safe to call more than
/// once; later calls are ignored.
pub fn init_with_filter(filter: &str) {
    let env = env_logger::Env::default().default_filter_or(filter);
    let _ = env_logger::Builder::from_env(env).try_init();
}
