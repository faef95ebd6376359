use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

/// Installs a stderr subscriber filtered by `RUST_LOG`, falling back to `default_filter`
/// (e.g. `"info"` or `"info,sfcw_lib::sweep=debug"`) when it is unset or unparsable.
///
/// Does nothing if a global subscriber is already installed.
pub fn init_logging(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_span_events(FmtSpan::NONE)
        .try_init();
}
