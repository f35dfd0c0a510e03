use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt};

/// Initialize structured logging for the application.
///
/// Logs go to stderr so stdout carries only the results document. The
/// level comes from `RUST_LOG` and defaults to `info`.
///
/// This must be called once at startup (in main.rs).
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    debug!("Logging initialized");
}
