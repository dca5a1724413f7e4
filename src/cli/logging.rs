use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter directive
pub const LOG_ENV: &str = "VCT_LOG";

/// Initialize structured logging to stderr
///
/// Uses `VCT_LOG` if set, otherwise `debug` with --verbose, otherwise the
/// configured level.
pub fn init(verbose: bool, configured: &str) {
    let fallback = if verbose { "debug" } else { configured };
    let env_filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
