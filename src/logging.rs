//! Structured logging initialization via `tracing`.

/// Initialize the tracing subscriber.
///
/// Respects the `RUST_LOG` environment variable for filtering and defaults to
/// `warn`. Output goes to stderr so stdout stays machine-readable.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
