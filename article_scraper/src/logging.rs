use tracing_subscriber::EnvFilter;

/// Installs the global `tracing` subscriber for a binary. `RUST_LOG` wins
/// over `default_filter`; repeated calls are no-ops.
pub fn init(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
