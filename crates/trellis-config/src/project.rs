//! Project Configuration (trellis.toml)
//!
//! Handles project-level configuration stored in `trellis.toml` at the project root.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Project configuration from trellis.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// What to run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run: Option<RunConfig>,

    /// How siblings are ordered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<OrderConfig>,

    /// Console output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ReportConfig>,

    /// Where plan files live
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discovery: Option<DiscoveryConfig>,
}

/// Run selection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Units to run when none are named on the command line
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub units: Vec<String>,

    /// Filter specs, `[!]provider=args`
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<String>,

    /// Run top-level units in parallel
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel: Option<bool>,

    /// Honor legacy suite factories (default: true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suite_methods: Option<bool>,
}

/// Ordering configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct OrderConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<OrderStrategy>,

    /// Seed for the shuffle strategy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Names run first by the declared strategy
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<String>,
}

/// Built-in ordering strategies
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderStrategy {
    Declared,
    Name,
    Reverse,
    Shuffle,
}

impl FromStr for OrderStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "declared" => Ok(Self::Declared),
            "name" => Ok(Self::Name),
            "reverse" => Ok(Self::Reverse),
            "shuffle" => Ok(Self::Shuffle),
            other => Err(ConfigError::InvalidValue {
                field: "order.strategy".to_string(),
                reason: format!(
                    "must be 'declared', 'name', 'reverse' or 'shuffle', got '{}'",
                    other
                ),
            }),
        }
    }
}

impl fmt::Display for OrderStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Declared => "declared",
            Self::Name => "name",
            Self::Reverse => "reverse",
            Self::Shuffle => "shuffle",
        };
        f.write_str(name)
    }
}

/// Report configuration, shared with the global config
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<ReportFormat>,

    /// One line per test instead of progress dots
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,

    /// Colored output (default: true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<bool>,
}

impl ReportConfig {
    /// Merge another report config into this one, field by field
    pub fn merge(&mut self, other: &ReportConfig) {
        if other.format.is_some() {
            self.format = other.format;
        }
        if other.verbose.is_some() {
            self.verbose = other.verbose;
        }
        if other.color.is_some() {
            self.color = other.color;
        }
    }
}

/// Output formats
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for ReportFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::InvalidValue {
                field: "report.format".to_string(),
                reason: format!("must be 'text' or 'json', got '{}'", other),
            }),
        }
    }
}

/// Plan discovery configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct DiscoveryConfig {
    /// Directory searched for plan files, relative to the project root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl ProjectConfig {
    /// Load project configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the project configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(run) = &self.run {
            if run.units.iter().any(|u| u.trim().is_empty()) {
                return Err(ConfigError::InvalidValue {
                    field: "run.units".to_string(),
                    reason: "unit names cannot be empty".to_string(),
                });
            }
            for spec in &run.filters {
                validate_filter_spec(spec)?;
            }
        }

        if let Some(order) = &self.order {
            if order.seed.is_some() && order.strategy != Some(OrderStrategy::Shuffle) {
                return Err(ConfigError::InvalidValue {
                    field: "order.seed".to_string(),
                    reason: "only the 'shuffle' strategy takes a seed".to_string(),
                });
            }
            if !order.names.is_empty() && order.strategy != Some(OrderStrategy::Declared) {
                return Err(ConfigError::InvalidValue {
                    field: "order.names".to_string(),
                    reason: "only the 'declared' strategy takes names".to_string(),
                });
            }
        }

        Ok(())
    }

    pub fn units(&self) -> &[String] {
        self.run.as_ref().map(|r| r.units.as_slice()).unwrap_or(&[])
    }

    pub fn filters(&self) -> &[String] {
        self.run.as_ref().map(|r| r.filters.as_slice()).unwrap_or(&[])
    }

    pub fn order_strategy(&self) -> Option<OrderStrategy> {
        self.order.as_ref().and_then(|o| o.strategy)
    }

    pub fn discovery_dir(&self) -> Option<&Path> {
        self.discovery.as_ref().and_then(|d| d.dir.as_deref())
    }

    /// Merge another project config into this one
    /// Other config takes precedence for non-None values
    pub fn merge(&mut self, other: &ProjectConfig) {
        if other.run.is_some() {
            self.run = other.run.clone();
        }
        if other.order.is_some() {
            self.order = other.order.clone();
        }
        if let Some(report) = &other.report {
            self.report.get_or_insert_with(Default::default).merge(report);
        }
        if other.discovery.is_some() {
            self.discovery = other.discovery.clone();
        }
    }
}

/// Shape check only; providers are resolved when the run is built
fn validate_filter_spec(spec: &str) -> ConfigResult<()> {
    let body = spec.strip_prefix('!').unwrap_or(spec);
    match body.split_once('=') {
        Some((provider, _)) if !provider.trim().is_empty() => Ok(()),
        _ => Err(ConfigError::InvalidValue {
            field: "run.filters".to_string(),
            reason: format!("expected 'provider=args', got '{}'", spec),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_parse_minimal_project_config() {
        let toml = r#"
[run]
units = ["CalcTest"]
"#;

        let config: ProjectConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.units(), &["CalcTest"]);
        assert!(config.filters().is_empty());
    }

    #[test]
    fn test_parse_full_project_config() {
        let toml = r#"
[run]
units = ["CalcTest", "TextTest"]
filters = ["category=fast", "!name=slow"]
parallel = true
suite_methods = false

[order]
strategy = "shuffle"
seed = 42

[report]
format = "json"
verbose = true
color = false

[discovery]
dir = "plans"
"#;

        let config: ProjectConfig = toml::from_str(toml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.order_strategy(), Some(OrderStrategy::Shuffle));
        assert_eq!(config.discovery_dir(), Some(Path::new("plans")));
        assert_eq!(
            config.report.as_ref().and_then(|r| r.format),
            Some(ReportFormat::Json)
        );
    }

    #[test]
    fn test_unknown_field_rejected() {
        let toml = r#"
[run]
unit = ["typo"]
"#;
        assert!(toml::from_str::<ProjectConfig>(toml).is_err());
    }

    #[rstest]
    #[case("category=fast", true)]
    #[case("!method=add(CalcTest)", true)]
    #[case("name=", true)]
    #[case("category", false)]
    #[case("=fast", false)]
    #[case("!", false)]
    fn test_filter_spec_shape(#[case] spec: &str, #[case] valid: bool) {
        assert_eq!(validate_filter_spec(spec).is_ok(), valid);
    }

    #[test]
    fn test_seed_requires_shuffle() {
        let config = ProjectConfig {
            order: Some(OrderConfig {
                strategy: Some(OrderStrategy::Name),
                seed: Some(7),
                names: Vec::new(),
            }),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[rstest]
    #[case("declared", OrderStrategy::Declared)]
    #[case("NAME", OrderStrategy::Name)]
    #[case("reverse", OrderStrategy::Reverse)]
    #[case("Shuffle", OrderStrategy::Shuffle)]
    fn test_order_strategy_from_str(#[case] text: &str, #[case] expected: OrderStrategy) {
        assert_eq!(text.parse::<OrderStrategy>().unwrap(), expected);
    }

    #[test]
    fn test_merge_configs() {
        let mut base = ProjectConfig {
            report: Some(ReportConfig {
                format: Some(ReportFormat::Text),
                verbose: Some(true),
                color: None,
            }),
            ..Default::default()
        };
        let override_config = ProjectConfig {
            report: Some(ReportConfig {
                format: Some(ReportFormat::Json),
                verbose: None,
                color: None,
            }),
            ..Default::default()
        };

        base.merge(&override_config);
        let report = base.report.unwrap();
        assert_eq!(report.format, Some(ReportFormat::Json));
        assert_eq!(report.verbose, Some(true));
    }
}
