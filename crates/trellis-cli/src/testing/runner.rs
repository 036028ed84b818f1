//! Test runner - turn run options and a catalog into a request and run it

use crate::testing::catalog::Catalog;
use std::sync::Arc;
use trellis_config::OrderStrategy;
use trellis_core::manipulation::{Declared, Reversed, Shuffled};
use trellis_core::runner::ErrorReportingRunner;
use trellis_core::{
    AllDefaultPossibilities, Computer, Core, FilterFactories, InitializationError, Request,
    RunResult, Sorter,
};

/// Name reported when the run could not be set up as asked
pub const ARGUMENTS: &str = "arguments";

/// What to run and how, after config and flags are merged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Units to run; empty runs every discovered unit
    pub units: Vec<String>,
    /// Filter specs, `[!]provider=args`
    pub filters: Vec<String>,
    pub order: Option<OrderStrategy>,
    /// Shuffle seed; required for the shuffle strategy
    pub seed: Option<u64>,
    /// Names run first by the declared strategy
    pub declared: Vec<String>,
    pub parallel: bool,
    pub suite_methods: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            units: Vec::new(),
            filters: Vec::new(),
            order: None,
            seed: None,
            declared: Vec::new(),
            parallel: false,
            suite_methods: true,
        }
    }
}

/// Builds and runs requests over a catalog
#[derive(Debug, Clone, Default)]
pub struct TestRunner {
    options: RunOptions,
}

impl TestRunner {
    pub fn new(options: RunOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Build the request for this run.
    ///
    /// Broken plans, unknown unit names and bad filter specs do not abort:
    /// they all end up in one error-reporting request, so the problem shows
    /// up as a single failing test.
    pub fn request(&self, catalog: &Catalog) -> Request {
        let mut causes = Vec::new();
        if let Some(error) = catalog.initialization_error() {
            causes.push(error);
        }

        let units = catalog.select(&self.options.units).unwrap_or_else(|error| {
            causes.push(error);
            Vec::new()
        });

        let factories = FilterFactories::new();
        let filters: Vec<_> = self
            .options
            .filters
            .iter()
            .filter_map(|spec| match factories.create_from_spec(spec) {
                Ok(filter) => Some(filter),
                Err(error) => {
                    causes.push(InitializationError::new(error.to_string()));
                    None
                }
            })
            .collect();

        if !causes.is_empty() {
            tracing::debug!(
                target: "trellis::cli",
                causes = causes.len(),
                "Run setup failed; reporting it as a test failure"
            );
            return Request::error_report(ARGUMENTS, InitializationError::merge(causes));
        }

        let computer = if self.options.parallel {
            Computer::parallel()
        } else {
            Computer::serial()
        };
        let builder =
            Arc::new(AllDefaultPossibilities::new().with_suite_methods(self.options.suite_methods));
        let mut request = Request::classes_with(&computer, builder, &units);

        for filter in filters {
            request = request.filter_with(filter);
        }

        match self.options.order {
            None => request,
            Some(OrderStrategy::Declared) => {
                request.order_with(Arc::new(Declared::new(self.options.declared.iter().cloned())))
            }
            Some(OrderStrategy::Name) => request.sort_with(Sorter::by_name()),
            Some(OrderStrategy::Reverse) => request.order_with(Arc::new(Reversed)),
            Some(OrderStrategy::Shuffle) => {
                request.order_with(Arc::new(Shuffled::new(self.options.seed.unwrap_or_default())))
            }
        }
    }

    /// Run the catalog through `core`
    pub fn run(&self, core: &Core, catalog: &Catalog) -> RunResult {
        match core.run_request(&self.request(catalog)) {
            Ok(result) => result,
            Err(error) => {
                let report = ErrorReportingRunner::new(
                    ARGUMENTS,
                    InitializationError::new(error.to_string()),
                );
                core.run_runner(&report)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::discovery::PlanFile;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn catalog() -> Catalog {
        let plan: PlanFile = toml::from_str(
            r#"
[[unit]]
name = "Calc"
categories = ["fast"]

[[unit.test]]
name = "adds"

[[unit.test]]
name = "divides"
outcome = "fail"
categories = ["slow"]

[[unit]]
name = "Text"

[[unit.test]]
name = "joins"
"#,
        )
        .unwrap();
        Catalog::from_plans(vec![plan])
    }

    fn test_names(runner: &TestRunner) -> Vec<String> {
        runner
            .request(&catalog())
            .runner()
            .unwrap()
            .description()
            .tests()
            .iter()
            .map(|d| d.display_name().to_string())
            .collect()
    }

    #[test]
    fn test_default_runs_everything_in_declaration_order() {
        let runner = TestRunner::default();
        assert_eq!(
            test_names(&runner),
            vec!["adds(Calc)", "divides(Calc)", "joins(Text)"]
        );

        let result = runner.run(&Core::new(), &catalog());
        assert_eq!(result.run_count(), 3);
        assert_eq!(result.failure_count(), 1);
    }

    #[rstest]
    #[case(vec!["!category=slow"], vec!["adds(Calc)", "joins(Text)"])]
    #[case(vec!["name=join"], vec!["joins(Text)"])]
    #[case(vec!["category=fast", "name=div"], vec!["divides(Calc)"])]
    fn test_filters_apply(#[case] filters: Vec<&str>, #[case] expected: Vec<&str>) {
        let runner = TestRunner::new(RunOptions {
            filters: filters.into_iter().map(String::from).collect(),
            ..Default::default()
        });
        assert_eq!(test_names(&runner), expected);
    }

    #[rstest]
    #[case(None, vec!["Text", "Calc"])]
    #[case(Some(OrderStrategy::Name), vec!["Calc", "Text"])]
    #[case(Some(OrderStrategy::Reverse), vec!["Calc", "Text"])]
    fn test_order_strategies(#[case] order: Option<OrderStrategy>, #[case] expected: Vec<&str>) {
        let runner = TestRunner::new(RunOptions {
            units: vec!["Text".to_string(), "Calc".to_string()],
            order,
            ..Default::default()
        });
        let description = runner.request(&catalog()).runner().unwrap().description();
        let units: Vec<&str> = description.children().iter().map(|d| d.display_name()).collect();
        assert_eq!(units, expected);
    }

    #[test]
    fn test_declared_order_puts_named_units_first() {
        let runner = TestRunner::new(RunOptions {
            order: Some(OrderStrategy::Declared),
            declared: vec!["Text".to_string()],
            ..Default::default()
        });
        assert_eq!(test_names(&runner)[0], "joins(Text)");
    }

    #[test]
    fn test_same_seed_same_order() {
        let options = RunOptions {
            order: Some(OrderStrategy::Shuffle),
            seed: Some(7),
            ..Default::default()
        };
        let first = test_names(&TestRunner::new(options.clone()));
        let second = test_names(&TestRunner::new(options));
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn test_bad_arguments_become_one_failure() {
        let runner = TestRunner::new(RunOptions {
            units: vec!["Ghost".to_string()],
            filters: vec!["colour=red".to_string()],
            ..Default::default()
        });

        let result = runner.run(&Core::new(), &catalog());

        assert_eq!(result.run_count(), 1);
        assert_eq!(result.failure_count(), 1);
        let failure = &result.failures()[0];
        assert_eq!(failure.test_header(), "initializationError(arguments)");
        assert!(failure.message().contains("unknown unit 'Ghost'"));
        assert!(failure.message().contains("unknown filter provider 'colour'"));
    }
}
