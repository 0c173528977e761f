use std::io::IsTerminal;

use tracing_subscriber::{
    layer::SubscriberExt, util::{SubscriberInitExt, TryInitError}, EnvFilter, Registry,
};

/// Installs the global tracing subscriber.
///
/// Logs go to stderr so stdout carries only the JSON report. The filter comes
/// from `RUST_LOG` and falls back to `info`. Fails if a global subscriber is
/// already installed.
pub fn init() -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_ansi(std::io::stderr().is_terminal());
    Registry::default().with(filter).with(fmt_layer).try_init()
}
