//! Subscriber setup

use tracing_subscriber::EnvFilter;

/// Install the global subscriber
///
/// `RUST_LOG` overrides the default `info` filter. Events go to stderr so
/// reports printed on stdout stay machine-readable.
pub(crate) fn init(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    // A subscriber may already be set when embedded in a test harness.
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
