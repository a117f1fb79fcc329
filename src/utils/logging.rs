//! Diagnostic logging on stderr.
//!
//! User-facing output goes through `ui::messages`; this is only for
//! `RUST_LOG=debug` style troubleshooting.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber. `RUST_LOG` wins over `level`; an
/// unparsable level falls back to `warn`. Calling it twice is harmless.
pub fn init(level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true)
                .with_ansi(false)
                .with_timer(fmt::time::ChronoUtc::new(
                    "%Y-%m-%dT%H:%M:%S%.3fZ".to_string(),
                )),
        )
        .with(env_filter)
        .try_init();
}
