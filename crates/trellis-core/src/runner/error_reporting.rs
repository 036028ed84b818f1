//! ErrorReportingRunner - turns a construction error into one failing test

use crate::description::Description;
use crate::error::{InitializationError, NoTestsRemainError, TestError};
use crate::manipulation::Filter;
use crate::notification::RunNotifier;
use crate::runner::Runner;
use crate::unit::TestUnit;

/// Method name of the synthetic failing test
pub const INITIALIZATION_ERROR: &str = "initializationError";

/// Stands in for units that could not be built.
///
/// Its single synthetic test fails with the construction error, so
/// discovery problems show up as ordinary failures in the run result.
pub struct ErrorReportingRunner {
    name: String,
    error: InitializationError,
}

impl ErrorReportingRunner {
    pub fn new(name: impl Into<String>, error: InitializationError) -> Self {
        Self {
            name: name.into(),
            error,
        }
    }

    /// Key the error to the units that were being built
    pub fn for_units(units: &[TestUnit], error: InitializationError) -> Self {
        let names: Vec<&str> = units.iter().map(TestUnit::name).collect();
        let name = if names.is_empty() {
            "(no units)".to_string()
        } else {
            names.join(", ")
        };
        Self::new(name, error)
    }

    pub fn error(&self) -> &InitializationError {
        &self.error
    }
}

impl Runner for ErrorReportingRunner {
    fn description(&self) -> Description {
        Description::suite(
            self.name.clone(),
            vec![Description::test(&self.name, INITIALIZATION_ERROR)],
        )
    }

    fn run(&self, notifier: &RunNotifier) {
        let description = self.description();
        for test in description.children() {
            notifier.run_test(test, || Err(TestError::Initialization(self.error.clone())));
        }
    }

    /// Construction errors stay visible whatever the filter
    fn filter(&mut self, _filter: &dyn Filter) -> Result<(), NoTestsRemainError> {
        Ok(())
    }

    fn initialization_error(&self) -> Option<&InitializationError> {
        Some(&self.error)
    }
}
