//! Trellis Configuration System
//!
//! Provides configuration management for Trellis test runs including:
//! - Project configuration (trellis.toml)
//! - Global user configuration (~/.trellis/config.toml)
//! - Environment overrides and precedence
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded and merged in the following order (later overrides earlier):
//! 1. Global config (~/.trellis/config.toml)
//! 2. Project config (./trellis.toml, searched upwards)
//! 3. Environment variables (TRELLIS_*)
//! 4. CLI flags
//!
//! # Example
//!
//! ```no_run
//! use trellis_config::ConfigLoader;
//! use std::path::Path;
//!
//! let mut loader = ConfigLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! println!("parallel: {}", config.parallel());
//! ```

pub mod global;
pub mod loader;
pub mod project;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Home directory not found")]
    HomeNotFound,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

// Re-export main types
pub use global::GlobalConfig;
pub use loader::{Config, ConfigLoader};
pub use project::{OrderStrategy, ProjectConfig, ReportConfig, ReportFormat};

/// Name of the project configuration file
pub const PROJECT_CONFIG_FILE: &str = "trellis.toml";

/// Parse a boolean flag the way environment overrides spell them
pub(crate) fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}
