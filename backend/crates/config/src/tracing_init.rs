use tracing_subscriber::{fmt, EnvFilter};

/// Resolve the log filter: `RUST_LOG`, then `LOG_LEVEL`, then `default_level`.
pub fn log_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_env("RUST_LOG")
        .or_else(|_| EnvFilter::try_from_env("LOG_LEVEL"))
        .unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Install the global subscriber. Logs go to stderr; stdout is left to
/// command output such as the sync report.
pub fn init_tracing(default_level: &str) {
    fmt()
        .with_env_filter(log_filter(default_level))
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
