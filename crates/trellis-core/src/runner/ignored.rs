//! IgnoredRunner - reports every test of an ignored unit as ignored

use crate::description::Description;
use crate::error::{InvalidOrderingError, NoTestsRemainError};
use crate::manipulation::{Filter, Orderer, Sorter};
use crate::notification::RunNotifier;
use crate::runner::Runner;
use crate::unit::{TestMethod, TestUnit};

pub struct IgnoredRunner {
    unit: TestUnit,
    methods: Vec<TestMethod>,
}

impl IgnoredRunner {
    pub fn new(unit: TestUnit) -> Self {
        Self {
            methods: unit.methods().to_vec(),
            unit,
        }
    }
}

impl Runner for IgnoredRunner {
    fn description(&self) -> Description {
        Description::suite(
            self.unit.name(),
            self.methods.iter().map(|m| m.describe(&self.unit)).collect(),
        )
    }

    fn run(&self, notifier: &RunNotifier) {
        let description = self.description();
        let tests = description.tests();
        if tests.is_empty() {
            notifier.fire_test_ignored(&description);
            return;
        }
        for test in &tests {
            notifier.fire_test_ignored(test);
        }
    }

    fn filter(&mut self, filter: &dyn Filter) -> Result<(), NoTestsRemainError> {
        // A unit without methods is a single opaque leaf
        if self.methods.is_empty() {
            return if filter.should_run(&self.description()) {
                Ok(())
            } else {
                Err(NoTestsRemainError(filter.describe()))
            };
        }
        let unit = self.unit.clone();
        self.methods.retain(|m| filter.should_run(&m.describe(&unit)));
        if self.methods.is_empty() {
            Err(NoTestsRemainError(filter.describe()))
        } else {
            Ok(())
        }
    }

    fn sort(&mut self, sorter: &Sorter) {
        let unit = self.unit.clone();
        sorter.sort_by_description(&mut self.methods, |m| m.describe(&unit));
    }

    fn order(&mut self, orderer: &Orderer) -> Result<(), InvalidOrderingError> {
        let unit = self.unit.clone();
        let methods = std::mem::take(&mut self.methods);
        self.methods = orderer.order_by_description(methods, |m| m.describe(&unit))?;
        Ok(())
    }
}
