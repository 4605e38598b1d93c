//! Diagnostic logging via `tracing`.
//!
//! User-facing output goes through the event channel and the CLI writer;
//! tracing is diagnostics only, routed to stderr and filtered with the
//! standard `RUST_LOG` syntax (default `warn`).

use tracing_subscriber::EnvFilter;

pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .ok();
}
