//! Configuration loading and precedence tests

use pretty_assertions::assert_eq;
use serial_test::serial;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use trellis_config::{ConfigError, ConfigLoader, OrderStrategy, ProjectConfig, ReportFormat};

fn create_config_file(dir: &Path, content: &str) -> PathBuf {
    let config_path = dir.join("trellis.toml");
    fs::write(&config_path, content).unwrap();
    config_path
}

fn isolated_loader(temp_dir: &TempDir) -> ConfigLoader {
    ConfigLoader::with_global_config_path(temp_dir.path().join("absent.toml"))
}

// ============================================================================
// Config Loading Tests
// ============================================================================

#[test]
#[serial]
fn test_load_full_project_config() {
    let temp_dir = TempDir::new().unwrap();
    create_config_file(
        temp_dir.path(),
        r#"
[run]
units = ["CalcTest", "TextTest"]
filters = ["category=fast"]
suite_methods = false

[order]
strategy = "declared"
names = ["TextTest"]

[report]
format = "json"
"#,
    );

    let config = isolated_loader(&temp_dir)
        .load_from_directory(temp_dir.path())
        .unwrap();

    assert_eq!(config.project.units(), &["CalcTest", "TextTest"]);
    assert_eq!(config.project.filters(), &["category=fast"]);
    assert!(!config.suite_methods());
    assert_eq!(config.order_strategy(), Some(OrderStrategy::Declared));
    assert_eq!(config.declared_order(), &["TextTest"]);
    assert_eq!(config.report_format(), ReportFormat::Json);
}

#[test]
#[serial]
fn test_empty_config_is_valid() {
    let temp_dir = TempDir::new().unwrap();
    create_config_file(temp_dir.path(), "");

    let config = isolated_loader(&temp_dir)
        .load_from_directory(temp_dir.path())
        .unwrap();

    assert!(config.is_project());
    assert_eq!(config.project, ProjectConfig::default());
}

#[test]
#[serial]
fn test_nearest_config_wins() {
    let temp_dir = TempDir::new().unwrap();
    create_config_file(temp_dir.path(), "[run]\nparallel = false\n");
    let nested = temp_dir.path().join("nested");
    fs::create_dir(&nested).unwrap();
    create_config_file(&nested, "[run]\nparallel = true\n");
    let deeper = nested.join("a").join("b");
    fs::create_dir_all(&deeper).unwrap();

    let config = isolated_loader(&temp_dir).load_from_directory(&deeper).unwrap();

    assert!(config.parallel());
    assert_eq!(config.project_root(), Some(nested.as_path()));
}

// ============================================================================
// Error Tests
// ============================================================================

#[test]
#[serial]
fn test_invalid_toml_reports_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = create_config_file(temp_dir.path(), "[run\nunits = ");

    let err = isolated_loader(&temp_dir).load_from_file(&path).unwrap_err();

    match err {
        ConfigError::TomlParseError { file, .. } => assert_eq!(file, path),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
#[serial]
fn test_malformed_filter_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = create_config_file(temp_dir.path(), "[run]\nfilters = [\"fast\"]\n");

    let err = isolated_loader(&temp_dir).load_from_file(&path).unwrap_err();

    assert_eq!(
        err.to_string(),
        "Invalid value for 'run.filters': expected 'provider=args', got 'fast'"
    );
}

#[test]
fn test_missing_file_is_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("trellis.toml");

    let err = ProjectConfig::load_from_file(&path).unwrap_err();

    assert!(matches!(err, ConfigError::NotFound(p) if p == path));
}

// ============================================================================
// Precedence Tests
// ============================================================================

#[test]
#[serial]
fn test_env_format_beats_project_and_global() {
    let temp_dir = TempDir::new().unwrap();
    let global = temp_dir.path().join("global.toml");
    fs::write(&global, "[report]\nformat = \"json\"\n").unwrap();
    create_config_file(temp_dir.path(), "[report]\nformat = \"json\"\n");

    env::set_var("TRELLIS_FORMAT", "text");
    let config = ConfigLoader::with_global_config_path(global)
        .load_from_directory(temp_dir.path())
        .unwrap();
    env::remove_var("TRELLIS_FORMAT");

    assert_eq!(config.report_format(), ReportFormat::Text);
}

#[test]
#[serial]
fn test_unknown_env_order_rejected() {
    let temp_dir = TempDir::new().unwrap();

    env::set_var("TRELLIS_ORDER", "random");
    let result = isolated_loader(&temp_dir).load_from_directory(temp_dir.path());
    env::remove_var("TRELLIS_ORDER");

    assert!(result.is_err());
}
