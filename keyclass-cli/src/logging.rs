use tracing_subscriber::{fmt, EnvFilter};

/// Install the global tracing subscriber.
///
/// `KEYCLASS_LOG` wins over `RUST_LOG`; with neither set the config's
/// `logging.level` is used. Logs and status lines go to stderr; stdout
/// carries only the JSON output.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_env("KEYCLASS_LOG")
        .or_else(|_| EnvFilter::try_from_env("RUST_LOG"))
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
