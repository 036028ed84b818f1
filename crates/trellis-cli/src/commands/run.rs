//! Run command - discover plans, run the selected units, report the result

use crate::config::Config as EnvConfig;
use crate::testing::runner::ARGUMENTS;
use crate::testing::{Catalog, ConsoleReporter, RunOptions, TestRunner};
use anyhow::Result;
use std::panic;
use std::path::PathBuf;
use std::sync::Arc;
use trellis_config::{Config, OrderStrategy, ReportFormat};
use trellis_core::runner::ErrorReportingRunner;
use trellis_core::{Core, InitializationError, RunResult};

/// Command line arguments of `trellis run`
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    pub units: Vec<String>,
    pub filters: Vec<String>,
    pub dir: Option<PathBuf>,
    pub order: Option<OrderStrategy>,
    pub seed: Option<u64>,
    pub parallel: bool,
    pub no_suite_methods: bool,
    pub json: bool,
    pub verbose: bool,
    pub no_color: bool,
}

/// Everything a run needs, with flags applied over config
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub options: RunOptions,
    /// Directory searched for plan files
    pub dir: PathBuf,
    pub format: ReportFormat,
    pub verbose: bool,
    pub color: bool,
}

impl Settings {
    /// Merge CLI flags over the loaded configuration.
    ///
    /// Units and filters given on the command line replace the configured
    /// ones. `--seed` without `--order` means shuffle; a shuffle without a
    /// seed gets a random one.
    pub fn resolve(config: &Config, env: &EnvConfig, args: &RunArgs) -> Self {
        let order = args
            .order
            .or(args.seed.map(|_| OrderStrategy::Shuffle))
            .or(config.order_strategy());
        let seed = match order {
            Some(OrderStrategy::Shuffle) => Some(args.seed.or(config.seed()).unwrap_or_else(rand::random)),
            _ => None,
        };

        let options = RunOptions {
            units: pick(&args.units, config.project.units()),
            filters: pick(&args.filters, config.project.filters()),
            order,
            seed,
            declared: config.declared_order().to_vec(),
            parallel: args.parallel || config.parallel(),
            suite_methods: !args.no_suite_methods && config.suite_methods(),
        };

        Self {
            options,
            dir: args.dir.clone().unwrap_or_else(|| config.discovery_dir()),
            format: if args.json {
                ReportFormat::Json
            } else {
                config.report_format()
            },
            verbose: args.verbose || config.verbose(),
            color: !args.no_color && !env.no_color && config.color(),
        }
    }
}

fn pick(flags: &[String], configured: &[String]) -> Vec<String> {
    if flags.is_empty() {
        configured.to_vec()
    } else {
        flags.to_vec()
    }
}

/// Run tests; returns the process exit code
pub fn run(args: RunArgs) -> Result<i32> {
    let config = super::load_config()?;
    let settings = Settings::resolve(&config, &EnvConfig::from_env(), &args);
    if !settings.color {
        colored::control::set_override(false);
    }

    let json = settings.format == ReportFormat::Json;
    if !json {
        println!("Discovering tests in {}...", settings.dir.display());
    }
    let catalog = Catalog::discover(&settings.dir);
    if !json {
        println!("Found {} units", catalog.units().len());
        if let Some(seed) = settings.options.seed {
            println!("Shuffle seed: {}", seed);
        }
        println!();
    }

    let core = Core::new();
    if !json {
        core.add_listener(Arc::new(ConsoleReporter::new(settings.verbose)));
    }
    let runner = TestRunner::new(settings.options);
    let result = with_quiet_panics(|| runner.run(&core, &catalog));

    finish(&result, json)
}

/// Run `f` with panics logged at debug level instead of printed.
///
/// Test bodies are run under `catch_unwind` and their panic messages end
/// up in the failure report; the default hook would also print them to
/// stderr in the middle of the progress output.
fn with_quiet_panics<T>(f: impl FnOnce() -> T) -> T {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(|info| {
        tracing::debug!(
            target: "trellis::cli",
            location = ?info.location(),
            "Test panicked: {}",
            panic_payload(info.payload())
        );
    }));
    let result = f();
    panic::set_hook(default_hook);
    result
}

fn panic_payload(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic>")
}

/// Report a command line that could not be parsed as a failed run
pub fn report_argument_error(message: &str, color: bool) -> Result<i32> {
    if !color {
        colored::control::set_override(false);
    }
    let core = Core::new();
    core.add_listener(Arc::new(ConsoleReporter::new(false)));
    let runner = ErrorReportingRunner::new(ARGUMENTS, InitializationError::new(message.trim()));
    let result = core.run_runner(&runner);
    finish(&result, false)
}

fn finish(result: &RunResult, json: bool) -> Result<i32> {
    if json {
        println!("{}", serde_json::to_string_pretty(&result.summary())?);
    }
    Ok(if result.was_successful() { 0 } else { 1 })
}
