//! Process-wide tracing setup.
//!
//! Called once by whatever composes the process (a test harness, a binary).
//! Library types never call it on their own.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Install the fmt subscriber filtered by `RUST_LOG` (default `info`).
/// Safe to call any number of times; only the first call has an effect, and
/// an already-installed global subscriber is left alone.
pub fn init() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    });
}
