//! Runners - describable, executable units forming a composite tree

pub mod class;
pub mod error_reporting;
pub mod ignored;
pub mod legacy;
pub mod suite;

pub use class::ClassRunner;
pub use error_reporting::ErrorReportingRunner;
pub use ignored::IgnoredRunner;
pub use legacy::LegacyRunner;
pub use suite::{Execution, Suite};

use crate::description::Description;
use crate::error::{InitializationError, InvalidOrderingError, NoTestsRemainError};
use crate::manipulation::{Filter, Orderer, Sorter};
use crate::notification::RunNotifier;

/// A leaf test runner or a composite suite.
///
/// `run` reports everything through the notifier and never returns an
/// error: failures inside a runner are its own to report. The manipulation
/// hooks default to treating the runner as a single opaque leaf.
pub trait Runner: Send + Sync {
    fn description(&self) -> Description;

    fn run(&self, notifier: &RunNotifier);

    fn test_count(&self) -> usize {
        self.description().test_count()
    }

    /// Drop children the filter rejects; `Err` when nothing is left
    fn filter(&mut self, filter: &dyn Filter) -> Result<(), NoTestsRemainError> {
        if filter.should_run(&self.description()) {
            Ok(())
        } else {
            Err(NoTestsRemainError(filter.describe()))
        }
    }

    /// Sort children recursively
    fn sort(&mut self, _sorter: &Sorter) {}

    /// Reorder children recursively
    fn order(&mut self, _orderer: &Orderer) -> Result<(), InvalidOrderingError> {
        Ok(())
    }

    /// The construction error this runner stands in for, if any
    fn initialization_error(&self) -> Option<&InitializationError> {
        None
    }
}

impl std::fmt::Debug for dyn Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Runner({})", self.description().display_name())
    }
}
