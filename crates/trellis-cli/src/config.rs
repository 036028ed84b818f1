//! CLI configuration via environment variables
//!
//! Settings that shape the process itself rather than a run. Run settings
//! live in `trellis.toml` and are loaded by `trellis-config`.

use std::env;

/// Log level used when `TRELLIS_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// CLI configuration loaded from environment variables
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Disable colored output (TRELLIS_NO_COLOR=1 or NO_COLOR=1)
    pub no_color: bool,
    /// `tracing` filter directives (TRELLIS_LOG=debug, TRELLIS_LOG=trellis::builder=debug)
    pub log_filter: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            no_color: lookup("TRELLIS_NO_COLOR").is_some() || lookup("NO_COLOR").is_some(),
            log_filter: lookup("TRELLIS_LOG").filter(|v| !v.trim().is_empty()),
        }
    }

    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }
}
