//! Tracing subscriber setup for the command-line front-end.

use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable holding a filter directive for this crate's binary.
pub const LOG_ENV: &str = "WINDGRID_LOG";

/// Picks the filter directive: `WINDGRID_LOG`, then `RUST_LOG`, then `default`.
fn resolve_filter(default_directive: &str) -> EnvFilter {
    match std::env::var(LOG_ENV) {
        Ok(directive) => EnvFilter::try_new(&directive).unwrap_or_else(|err| {
            eprintln!("invalid {LOG_ENV} directive ({err}); using \"{default_directive}\"");
            EnvFilter::new(default_directive)
        }),
        Err(_) => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directive)),
    }
}

/// Installs a global fmt subscriber writing to stderr.
///
/// Stdout is left to reports and exported records. Calling this more than
/// once is harmless; later calls leave the first subscriber in place.
pub fn init_tracing(default_directive: &str) {
    tracing_subscriber::registry()
        .with(resolve_filter(default_directive))
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .ok();
}
