//! Diagnostic tracing setup.
//!
//! Simulation lines go to stdout through the event sink. Tracing output is
//! separate and goes to stderr.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "labpool=warn";

/// Initialize tracing with RUST_LOG and LOG_FORMAT support.
///
/// `RUST_LOG` overrides the default `labpool=warn` filter. `LOG_FORMAT=json`
/// switches to JSON lines. Calling this twice is harmless.
pub fn init_tracing() {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(DEFAULT_FILTER)
    };

    let use_json = std::env::var("LOG_FORMAT").as_deref() == Ok("json");

    if use_json {
        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr));
        let _ = subscriber.try_init();
    } else {
        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr));
        let _ = subscriber.try_init();
    }
}
