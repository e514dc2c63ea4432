//! Observability utilities.

use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Initialize the tracing subscriber once for the process.
///
/// Plain text by default, JSON with `MAILHOP_LOG_FORMAT=json`. The filter
/// defaults to `info` if `RUST_LOG` is unset.
pub fn init_tracing() {
    TRACING_INIT.get_or_init(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let json = std::env::var("MAILHOP_LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let result = if json {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .try_init()
        } else {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().compact().with_target(false))
                .try_init()
        };

        if let Err(err) = result {
            eprintln!("tracing init skipped: {err}");
        }
    });
}
