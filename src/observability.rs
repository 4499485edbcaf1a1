//! Logging setup for the binary.
//!
//! Everything goes to stderr; stdout carries only the version output.

use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const DEFAULT_FILTER: &str = "warn";

/// Pick the log filter: `--quiet` wins over `-v`, which wins over `RUST_LOG`.
pub fn env_filter(verbose: u8, quiet: bool) -> EnvFilter {
    if quiet {
        return EnvFilter::new("error");
    }
    match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
        1 => EnvFilter::new("git_stamp=info"),
        2 => EnvFilter::new("git_stamp=debug"),
        _ => EnvFilter::new("git_stamp=trace"),
    }
}

/// Install the stderr subscriber. A second call is a no-op.
pub fn init_logging(filter: EnvFilter) {
    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(filter)
        .try_init();
}
