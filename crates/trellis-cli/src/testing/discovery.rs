//! Plan discovery - find `*.trellis.toml` files and parse the units they declare

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// File name suffix that marks a plan file
pub const PLAN_SUFFIX: &str = ".trellis.toml";

/// Problems found while reading plan files
#[derive(Error, Debug)]
pub enum PlanError {
    #[error("Failed to read plan file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid plan file {path}: {error}")]
    Parse {
        path: PathBuf,
        error: toml::de::Error,
    },

    #[error("Unit '{name}' is declared in both {first} and {second}")]
    DuplicateUnit {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("Unit '{unit}' references unknown unit '{reference}'")]
    UnknownReference { unit: String, reference: String },
}

/// One plan file: a list of `[[unit]]` tables
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PlanFile {
    #[serde(default, rename = "unit")]
    pub units: Vec<UnitPlan>,
}

/// A scripted test unit
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct UnitPlan {
    pub name: String,

    /// Reason the whole unit is skipped
    #[serde(default)]
    pub ignore: Option<String>,

    /// Named runner strategy, e.g. `suite`
    #[serde(default)]
    pub run_with: Option<String>,

    /// Units composed by the `suite` strategy
    #[serde(default)]
    pub members: Option<Vec<String>>,

    /// Units returned by a legacy suite factory
    #[serde(default)]
    pub suite: Option<Vec<String>>,

    /// Run through the legacy adapter
    #[serde(default)]
    pub legacy: bool,

    #[serde(default)]
    pub categories: Vec<String>,

    #[serde(default, rename = "test")]
    pub tests: Vec<TestPlan>,
}

impl UnitPlan {
    /// Every unit name this unit points at
    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.members
            .iter()
            .chain(self.suite.iter())
            .flatten()
            .map(String::as_str)
    }
}

/// A scripted test inside a unit
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TestPlan {
    pub name: String,

    #[serde(default)]
    pub outcome: Outcome,

    /// Failure, assumption or panic message
    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub ignore: Option<String>,

    #[serde(default)]
    pub categories: Vec<String>,
}

/// What a scripted test does when it runs
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    #[default]
    Pass,
    Fail,
    Assume,
    Panic,
}

/// Result of walking a directory for plan files
#[derive(Debug, Default)]
pub struct Discovery {
    /// Parsed plans, sorted by path
    pub plans: Vec<(PathBuf, PlanFile)>,
    /// Files that could not be read or parsed
    pub errors: Vec<PlanError>,
}

impl Discovery {
    /// Discover every plan file in a directory tree
    pub fn discover(root: &Path) -> Self {
        let mut discovery = Discovery::default();

        for entry in WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
        {
            let path = entry.path();
            if !entry.file_type().is_file() || !is_plan_file(path) {
                continue;
            }
            match load_plan(path) {
                Ok(plan) => discovery.plans.push((path.to_path_buf(), plan)),
                Err(e) => discovery.errors.push(e),
            }
        }

        tracing::debug!(
            target: "trellis::discovery",
            root = %root.display(),
            plans = discovery.plans.len(),
            errors = discovery.errors.len(),
            "Discovered plan files"
        );

        discovery
    }

    /// Total number of declared units
    pub fn unit_count(&self) -> usize {
        self.plans.iter().map(|(_, plan)| plan.units.len()).sum()
    }
}

fn is_plan_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(PLAN_SUFFIX))
}

/// Read and parse a single plan file
pub fn load_plan(path: &Path) -> Result<PlanFile, PlanError> {
    let content = fs::read_to_string(path).map_err(|source| PlanError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|error| PlanError::Parse {
        path: path.to_path_buf(),
        error,
    })
}
