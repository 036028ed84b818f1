//! List command - print the test tree without running anything

use crate::testing::{Catalog, RunOptions, TestRunner};
use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use trellis_core::Description;

/// Command line arguments of `trellis list`
#[derive(Debug, Clone, Default)]
pub struct ListArgs {
    pub units: Vec<String>,
    pub dir: Option<PathBuf>,
}

/// List the tests that `trellis run` would execute
pub fn run(args: ListArgs) -> Result<()> {
    let config = super::load_config()?;
    let dir = args.dir.unwrap_or_else(|| config.discovery_dir());
    let units = if args.units.is_empty() {
        config.project.units().to_vec()
    } else {
        args.units
    };

    let catalog = Catalog::discover(&dir);
    let runner = TestRunner::new(RunOptions {
        units,
        suite_methods: config.suite_methods(),
        ..Default::default()
    });
    let description = describe(&runner, &catalog)?;

    print!("{}", description.render_tree());
    println!();
    println!("{} tests", description.test_count());
    Ok(())
}

/// Build the runner tree and return its description
fn describe(runner: &TestRunner, catalog: &Catalog) -> Result<Description> {
    let root = runner
        .request(catalog)
        .runner()
        .context("Failed to build the test tree")?;
    if let Some(error) = root.initialization_error() {
        bail!("Cannot list tests: {}", error);
    }
    Ok(root.description())
}
