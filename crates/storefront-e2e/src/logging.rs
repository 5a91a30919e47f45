//! Tracing subscriber setup for test binaries.
//!
//! `RUST_LOG` wins when set; otherwise the suite logs its own spans at
//! `info` and keeps the CDP client quiet. `STOREFRONT_LOG_FORMAT=json`
//! switches to one JSON object per line for CI log collectors.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "storefront_e2e=info,chromiumoxide=warn";

/// Output format of the subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human readable, one line per event
    #[default]
    Compact,
    /// Newline-delimited JSON
    Json,
}

impl LogFormat {
    /// Format named by `STOREFRONT_LOG_FORMAT`
    #[must_use]
    pub fn from_env() -> Self {
        match std::env::var("STOREFRONT_LOG_FORMAT") {
            Ok(value) if value.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Compact,
        }
    }
}

/// Install the global subscriber; later calls are no-ops
pub fn init() {
    init_with(LogFormat::from_env());
}

/// Install the global subscriber with an explicit format
///
/// Returns `false` when a subscriber was already installed.
pub fn init_with(format: LogFormat) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .with_target(true);
    match format {
        LogFormat::Compact => builder.compact().try_init().is_ok(),
        LogFormat::Json => builder.json().try_init().is_ok(),
    }
}
