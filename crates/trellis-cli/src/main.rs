use anyhow::Result;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;
use trellis_config::OrderStrategy;

mod commands;
mod config;
mod testing;

/// Trellis test orchestration runtime.
///
/// Trellis discovers test plans (`*.trellis.toml`), builds a tree of runners
/// for the units they declare, and runs it with filtering, ordering and
/// parallel execution.
///
/// EXAMPLES:
///     trellis run                         Run every discovered unit
///     trellis run CalcTest -f name=add    Run matching tests of one unit
///     trellis run --order shuffle         Run in a random (reported) order
///     trellis list                        Show the test tree
///
/// ENVIRONMENT VARIABLES:
///     TRELLIS_LOG       Log filter, e.g. 'debug' or 'trellis::builder=debug'
///     TRELLIS_PARALLEL  Set to '1' to run units in parallel
///     TRELLIS_ORDER     Default order strategy
///     TRELLIS_SEED      Default shuffle seed
///     TRELLIS_FORMAT    'text' or 'json'
///     NO_COLOR          Set to disable colored output
#[derive(Parser)]
#[command(name = "trellis")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run test units
    ///
    /// Discovers plan files under the plan directory and runs the named
    /// units, or every unit when none are named. Flags override the
    /// project's trellis.toml.
    ///
    /// FILTERS:
    ///     category=fast,db        Tests in any of the categories
    ///     name=parse              Tests whose name contains 'parse'
    ///     method=add(CalcTest)    Exactly one test
    ///     !category=slow          Leading '!' excludes
    ///
    /// EXAMPLES:
    ///     trellis run                          Run everything
    ///     trellis run CalcTest TextTest        Run two units
    ///     trellis run -f '!category=slow'      Skip slow tests
    ///     trellis run --seed 42                Reproduce a shuffled run
    ///     trellis run --json                   Print a JSON summary
    #[command(visible_alias = "r")]
    Run {
        /// Units to run (default: all discovered units)
        units: Vec<String>,
        /// Filter spec, repeatable; all filters must match
        #[arg(long = "filter", short = 'f', value_name = "SPEC")]
        filters: Vec<String>,
        /// Directory searched for plan files
        #[arg(long, short = 'd')]
        dir: Option<PathBuf>,
        /// Order strategy: declared, name, reverse or shuffle
        #[arg(long, value_name = "STRATEGY")]
        order: Option<OrderStrategy>,
        /// Shuffle seed (implies --order shuffle)
        #[arg(long)]
        seed: Option<u64>,
        /// Run units in parallel
        #[arg(long)]
        parallel: bool,
        /// Ignore legacy suite factories
        #[arg(long)]
        no_suite_methods: bool,
        /// Print a JSON summary instead of progress output
        #[arg(long)]
        json: bool,
        /// One line per test
        #[arg(long, short = 'v')]
        verbose: bool,
        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// List the test tree without running it
    ///
    /// EXAMPLES:
    ///     trellis list               List every unit
    ///     trellis list CalcTest      List one unit
    #[command(visible_alias = "ls")]
    List {
        /// Units to list (default: all discovered units)
        units: Vec<String>,
        /// Directory searched for plan files
        #[arg(long, short = 'd')]
        dir: Option<PathBuf>,
    },

    /// Generate shell completion scripts
    ///
    /// EXAMPLES:
    ///     trellis completions bash > ~/.local/share/bash-completion/completions/trellis
    ///     trellis completions zsh > ~/.zfunc/_trellis
    ///     trellis completions fish > ~/.config/fish/completions/trellis.fish
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let env = config::Config::from_env();
    init_logging(&env);

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => err.exit(),
            _ => {
                let code = commands::run::report_argument_error(&err.to_string(), !env.no_color)?;
                process::exit(code);
            }
        },
    };

    match cli.command {
        Commands::Run {
            units,
            filters,
            dir,
            order,
            seed,
            parallel,
            no_suite_methods,
            json,
            verbose,
            no_color,
        } => {
            let code = commands::run::run(commands::run::RunArgs {
                units,
                filters,
                dir,
                order,
                seed,
                parallel,
                no_suite_methods,
                json,
                verbose,
                no_color,
            })?;
            if code != 0 {
                process::exit(code);
            }
            Ok(())
        }
        Commands::List { units, dir } => commands::list::run(commands::list::ListArgs { units, dir }),
        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "trellis", &mut io::stdout());
            Ok(())
        }
    }
}

/// Send `tracing` output to stderr, filtered by TRELLIS_LOG
fn init_logging(env: &config::Config) {
    let filter = EnvFilter::try_new(env.log_filter())
        .unwrap_or_else(|_| EnvFilter::new(config::DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_with_flags() {
        let cli = Cli::parse_from([
            "trellis", "run", "CalcTest", "-f", "category=fast", "--filter", "!name=slow",
            "--order", "reverse", "--parallel", "-v",
        ]);

        match cli.command {
            Commands::Run {
                units,
                filters,
                order,
                parallel,
                verbose,
                json,
                ..
            } => {
                assert_eq!(units, vec!["CalcTest"]);
                assert_eq!(filters, vec!["category=fast", "!name=slow"]);
                assert_eq!(order, Some(OrderStrategy::Reverse));
                assert!(parallel);
                assert!(verbose);
                assert!(!json);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_parse_run_alias_without_units() {
        let cli = Cli::parse_from(["trellis", "r", "--seed", "42"]);
        match cli.command {
            Commands::Run { units, seed, .. } => {
                assert!(units.is_empty());
                assert_eq!(seed, Some(42));
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_unknown_order_is_a_parse_error() {
        let result = Cli::try_parse_from(["trellis", "run", "--order", "random"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_list() {
        let cli = Cli::parse_from(["trellis", "ls", "CalcTest", "--dir", "plans"]);
        match cli.command {
            Commands::List { units, dir } => {
                assert_eq!(units, vec!["CalcTest"]);
                assert_eq!(dir, Some(PathBuf::from("plans")));
            }
            _ => panic!("Expected List command"),
        }
    }

    #[test]
    fn test_parse_completions() {
        let cli = Cli::parse_from(["trellis", "completions", "bash"]);
        assert!(matches!(cli.command, Commands::Completions { shell: Shell::Bash }));
    }
}
