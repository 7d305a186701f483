//! Development-time tracing for debugging the coordinator.
//!
//! Tracing is dev diagnostics via `RUST_LOG`, output to stderr. It is not part
//! of the product output: scan results and provisioning outcomes go to stdout
//! as structured values, warnings about skipped entities go here.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing subscriber for development logging.
///
/// Reads `RUST_LOG` env var. Defaults to `warn` if unset.
/// Output: stderr, compact format.
///
/// # Example
/// ```bash
/// RUST_LOG=saga=debug cargo run -- scan
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
