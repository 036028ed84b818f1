//! Computer - builds the top-level suite for a batch of units

use crate::builder::{BuildContext, RunnerBuilder};
use crate::error::InitializationError;
use crate::runner::{Execution, Suite};
use crate::unit::TestUnit;

/// Decides how a batch of units is composed into one suite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Computer {
    execution: Execution,
}

impl Computer {
    /// Children run one after another
    pub fn serial() -> Self {
        Self {
            execution: Execution::Serial,
        }
    }

    /// Top-level children run on the rayon pool
    pub fn parallel() -> Self {
        Self {
            execution: Execution::Parallel,
        }
    }

    pub fn execution(&self) -> Execution {
        self.execution
    }

    /// Build the root suite, failing if any unit cannot be built
    pub fn suite(
        &self,
        builder: &dyn RunnerBuilder,
        units: &[TestUnit],
    ) -> Result<Suite, InitializationError> {
        let mut ctx = BuildContext::new(builder);
        Ok(Suite::from_units(&mut ctx, None, units)?.with_execution(self.execution))
    }
}
