//! Tracing setup for the `preflight` binary
//!
//! Logs always go to stderr so stdout carries only the report.

use clap::ValueEnum;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug, Default)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Filter directive for the given flags, `None` to defer to `RUST_LOG`
pub fn level_directive(verbose: u8, quiet: bool) -> Option<&'static str> {
    if quiet {
        return Some("error");
    }
    match verbose {
        0 => None,
        1 => Some("info"),
        2 => Some("debug"),
        _ => Some("trace"),
    }
}

/// Install the global subscriber
///
/// `-v`/`-q` take precedence over `RUST_LOG`, which defaults to `warn`.
pub fn init(verbose: u8, quiet: bool, format: LogFormat) -> Result<(), TryInitError> {
    let filter = match level_directive(verbose, quiet) {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into())),
    };

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_directive() {
        assert_eq!(level_directive(0, false), None);
        assert_eq!(level_directive(1, false), Some("info"));
        assert_eq!(level_directive(2, false), Some("debug"));
        assert_eq!(level_directive(5, false), Some("trace"));
        assert_eq!(level_directive(3, true), Some("error"));
    }
}
