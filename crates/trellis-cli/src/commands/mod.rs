//! Command implementations

pub mod list;
pub mod run;

use anyhow::{Context, Result};
use std::env;
use trellis_config::{Config, ConfigLoader};

/// Load `trellis.toml` (searched upwards from the current directory) and user defaults
pub(crate) fn load_config() -> Result<Config> {
    let cwd = env::current_dir().context("Failed to determine current directory")?;
    ConfigLoader::new()
        .load_from_directory(&cwd)
        .context("Failed to load configuration")
}
