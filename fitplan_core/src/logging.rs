//! Logging setup for the fitplan binaries.
//!
//! Diagnostics go to stderr so command output on stdout stays scriptable.
//! The level comes from `-v` flags unless `FITPLAN_LOG` or `RUST_LOG` holds
//! a filter directive, in that order.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Filter directive read before `RUST_LOG`
pub const LOG_ENV: &str = "FITPLAN_LOG";

/// Default level for a count of `-v` flags
pub fn level_for_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Initialize logging for a CLI run with `verbose` `-v` flags
pub fn init(verbose: u8) {
    let directive = std::env::var(LOG_ENV)
        .or_else(|_| std::env::var(EnvFilter::DEFAULT_ENV))
        .ok();
    init_with_filter(build_filter(directive.as_deref(), level_for_verbosity(verbose)));
}

/// Initialize logging with a specific default level, still overridable
/// through the environment.
///
/// Calling it twice is harmless; the second call is ignored.
pub fn init_with_level(default_level: &str) {
    let directive = std::env::var(LOG_ENV).ok();
    init_with_filter(build_filter(directive.as_deref(), default_level));
}

fn init_with_filter(filter: EnvFilter) {
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_target(false).with_writer(std::io::stderr))
        .try_init();
}

/// Filter from an explicit directive, falling back to `default_level` when
/// the directive is absent or does not parse
fn build_filter(directive: Option<&str>, default_level: &str) -> EnvFilter {
    match directive.map(EnvFilter::try_new) {
        Some(Ok(filter)) => filter,
        Some(Err(e)) => {
            eprintln!("Ignoring log filter: {}", e);
            EnvFilter::new(default_level)
        }
        None => EnvFilter::new(default_level),
    }
}

/// Initialize logging for testing (captures logs for test output)
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(level_for_verbosity(0), "warn");
        assert_eq!(level_for_verbosity(1), "info");
        assert_eq!(level_for_verbosity(2), "debug");
        assert_eq!(level_for_verbosity(9), "trace");
    }

    #[test]
    fn test_explicit_directive_wins_over_verbosity() {
        let filter = build_filter(Some("fitplan_core::store=trace"), "warn");
        assert!(filter.to_string().contains("fitplan_core::store=trace"));

        let filter = build_filter(None, "info");
        assert_eq!(filter.to_string(), "info");
    }

    #[test]
    fn test_init_is_idempotent() {
        init_test();
        init_with_level("debug");
        tracing::debug!("logging initialized twice without panicking");
    }
}
