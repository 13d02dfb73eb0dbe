//! Diagnostic logging setup
//!
//! Library code only emits `tracing` events; the binary decides where they
//! go. Output is filtered by `RUST_LOG` (default `warn`) and written to
//! stderr so it never mixes with command output.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber
///
/// Calling it again is a no-op.
pub fn setup_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .try_init();
}
