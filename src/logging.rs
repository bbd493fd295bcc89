//! Log output setup

use tracing_subscriber::EnvFilter;

/// Install a JSON fmt subscriber filtered by `RUST_LOG` (default `info`).
///
/// Calling it again once a subscriber is installed does nothing.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_target(false)
        .try_init();
}
