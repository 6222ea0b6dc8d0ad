//! Tracing subscriber setup.
//!
//! Logs go to stderr so command output on stdout stays machine-readable.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Default filter for a given `-v` count.
#[must_use]
pub fn default_filter(verbosity: u8) -> String {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    format!("warn,mantle={level},mantle_lib={level}")
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the verbosity-derived default. Returns
/// `false` if a subscriber was already installed.
pub fn init(verbosity: u8) -> bool {
    let env_filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter(verbosity)),
    );

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()
        .is_ok()
}
