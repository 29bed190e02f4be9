//! Tracing setup for the `lingo` binary.
//!
//! `LOG_LEVEL` holds the filter directives (default `warn`, so interactive
//! output stays readable). Logs go to stderr.

use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
