//! Global Configuration (~/.trellis/config.toml)
//!
//! Handles user-level defaults stored in `~/.trellis/config.toml`.

use crate::project::ReportConfig;
use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global user configuration from ~/.trellis/config.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    /// Report defaults, overridden by the project's `[report]`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ReportConfig>,
}

impl GlobalConfig {
    /// Load global configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })
    }

    /// Get the global config file path (~/.trellis/config.toml)
    pub fn global_config_path() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".trellis").join("config.toml"))
    }

    /// Merge another global config into this one
    pub fn merge(&mut self, other: &GlobalConfig) {
        if let Some(report) = &other.report {
            self.report.get_or_insert_with(Default::default).merge(report);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::ReportFormat;

    #[test]
    fn test_parse_global_config() {
        let toml = r#"
[report]
format = "json"
color = false
"#;

        let config: GlobalConfig = toml::from_str(toml).unwrap();
        let report = config.report.unwrap();
        assert_eq!(report.format, Some(ReportFormat::Json));
        assert_eq!(report.color, Some(false));
        assert_eq!(report.verbose, None);
    }

    #[test]
    fn test_project_sections_not_allowed() {
        let toml = r#"
[run]
units = ["A"]
"#;
        assert!(toml::from_str::<GlobalConfig>(toml).is_err());
    }

    #[test]
    fn test_merge_configs() {
        let mut base = GlobalConfig::default();
        let other = GlobalConfig {
            report: Some(ReportConfig {
                verbose: Some(true),
                ..Default::default()
            }),
        };

        base.merge(&other);
        assert_eq!(base.report.and_then(|r| r.verbose), Some(true));
    }
}
