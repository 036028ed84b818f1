//! Configuration Loader
//!
//! Handles loading and merging configuration from multiple sources with proper precedence.

use crate::global::GlobalConfig;
use crate::project::{OrderStrategy, ProjectConfig, ReportConfig, ReportFormat};
use crate::{parse_flag, ConfigError, ConfigResult, PROJECT_CONFIG_FILE};
use std::env;
use std::path::{Path, PathBuf};

/// Configuration loader
///
/// Loads configuration from multiple sources and merges them with proper precedence:
/// 1. Global config (~/.trellis/config.toml) - lowest priority
/// 2. Project config (./trellis.toml) - overrides global
/// 3. Environment variables (TRELLIS_*) - overrides project
/// 4. CLI flags - highest priority (handled by caller)
#[derive(Debug, Default)]
pub struct ConfigLoader {
    /// Cached global config path
    global_config_path: Option<PathBuf>,
}

/// Merged configuration result
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Project configuration, with environment overrides applied
    pub project: ProjectConfig,

    /// Global configuration
    pub global: GlobalConfig,

    /// Project root directory (where trellis.toml was found)
    pub project_root: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            global_config_path: None,
        }
    }

    /// Read the global config from `path` instead of the home directory
    pub fn with_global_config_path(path: impl Into<PathBuf>) -> Self {
        Self {
            global_config_path: Some(path.into()),
        }
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find trellis.toml, then loads and merges
    /// global config if it exists.
    pub fn load_from_directory(&mut self, start_dir: &Path) -> ConfigResult<Config> {
        let (project_root, project_config) = self.find_project_config(start_dir)?;
        let global_config = self.load_global_config()?;
        let project_config = apply_env_overrides(project_config)?;

        tracing::debug!(
            target: "trellis::config",
            root = ?project_root,
            "Loaded configuration"
        );

        Ok(Config {
            project: project_config,
            global: global_config,
            project_root,
        })
    }

    /// Load configuration from a specific project config file
    pub fn load_from_file(&mut self, config_path: &Path) -> ConfigResult<Config> {
        let project_config = ProjectConfig::load_from_file(config_path)?;
        let global_config = self.load_global_config()?;
        let project_config = apply_env_overrides(project_config)?;

        Ok(Config {
            project: project_config,
            global: global_config,
            project_root: config_path.parent().map(Path::to_path_buf),
        })
    }

    /// Find project configuration by walking up directory tree
    fn find_project_config(&self, start_dir: &Path) -> ConfigResult<(Option<PathBuf>, ProjectConfig)> {
        for dir in start_dir.ancestors() {
            let config_path = dir.join(PROJECT_CONFIG_FILE);
            if config_path.exists() {
                let project_config = ProjectConfig::load_from_file(&config_path)?;
                return Ok((Some(dir.to_path_buf()), project_config));
            }
        }
        Ok((None, ProjectConfig::default()))
    }

    /// Load global configuration; a missing file or home directory means defaults
    fn load_global_config(&mut self) -> ConfigResult<GlobalConfig> {
        let path = match &self.global_config_path {
            Some(path) => path.clone(),
            None => match GlobalConfig::global_config_path() {
                Ok(path) => {
                    self.global_config_path = Some(path.clone());
                    path
                }
                Err(ConfigError::HomeNotFound) => return Ok(GlobalConfig::default()),
                Err(e) => return Err(e),
            },
        };

        if !path.exists() {
            return Ok(GlobalConfig::default());
        }
        GlobalConfig::load_from_file(&path)
    }

    /// Get the global configuration directory (~/.trellis)
    pub fn global_config_dir() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".trellis"))
    }
}

/// Apply environment variable overrides to project config
///
/// Recognized: TRELLIS_PARALLEL, TRELLIS_SEED, TRELLIS_FORMAT, TRELLIS_ORDER
fn apply_env_overrides(mut config: ProjectConfig) -> ConfigResult<ProjectConfig> {
    if let Ok(parallel) = env::var("TRELLIS_PARALLEL") {
        config.run.get_or_insert_with(Default::default).parallel = Some(parse_flag(&parallel));
    }

    if let Ok(strategy) = env::var("TRELLIS_ORDER") {
        config.order.get_or_insert_with(Default::default).strategy = Some(strategy.parse()?);
    }

    if let Ok(seed) = env::var("TRELLIS_SEED") {
        let seed = seed.trim().parse::<u64>().map_err(|e| ConfigError::InvalidValue {
            field: "TRELLIS_SEED".to_string(),
            reason: e.to_string(),
        })?;
        config.order.get_or_insert_with(Default::default).seed = Some(seed);
    }

    if let Ok(format) = env::var("TRELLIS_FORMAT") {
        config.report.get_or_insert_with(Default::default).format = Some(format.parse()?);
    }

    Ok(config)
}

impl Config {
    /// Report settings: project over global
    pub fn report(&self) -> ReportConfig {
        let mut report = self.global.report.clone().unwrap_or_default();
        if let Some(project) = &self.project.report {
            report.merge(project);
        }
        report
    }

    pub fn report_format(&self) -> ReportFormat {
        self.report().format.unwrap_or_default()
    }

    pub fn verbose(&self) -> bool {
        self.report().verbose.unwrap_or(false)
    }

    pub fn color(&self) -> bool {
        self.report().color.unwrap_or(true)
    }

    pub fn parallel(&self) -> bool {
        self.project.run.as_ref().and_then(|r| r.parallel).unwrap_or(false)
    }

    pub fn suite_methods(&self) -> bool {
        self.project.run.as_ref().and_then(|r| r.suite_methods).unwrap_or(true)
    }

    pub fn order_strategy(&self) -> Option<OrderStrategy> {
        self.project.order_strategy()
    }

    pub fn seed(&self) -> Option<u64> {
        self.project.order.as_ref().and_then(|o| o.seed)
    }

    pub fn declared_order(&self) -> &[String] {
        self.project.order.as_ref().map(|o| o.names.as_slice()).unwrap_or(&[])
    }

    /// Directory searched for plan files
    pub fn discovery_dir(&self) -> PathBuf {
        let root = self.project_root.clone().unwrap_or_else(|| PathBuf::from("."));
        match self.project.discovery_dir() {
            Some(dir) => root.join(dir),
            None => root,
        }
    }

    /// Get the project root directory
    pub fn project_root(&self) -> Option<&Path> {
        self.project_root.as_deref()
    }

    /// Check if this is a project (has trellis.toml)
    pub fn is_project(&self) -> bool {
        self.project_root.is_some()
    }
}
