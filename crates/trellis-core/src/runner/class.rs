//! ClassRunner - the default runner for a modern unit

use crate::description::Description;
use crate::error::{InitializationError, InvalidOrderingError, NoTestsRemainError};
use crate::manipulation::{Filter, Orderer, Sorter};
use crate::notification::RunNotifier;
use crate::runner::Runner;
use crate::unit::{TestMethod, TestUnit};
use std::collections::HashSet;
use std::sync::OnceLock;

/// Runs each test method of a unit in declaration order
pub struct ClassRunner {
    unit: TestUnit,
    methods: Vec<TestMethod>,
    description: OnceLock<Description>,
}

impl ClassRunner {
    /// Validate the unit and create its runner
    pub fn new(unit: TestUnit) -> Result<Self, InitializationError> {
        if unit.methods().is_empty() {
            return Err(InitializationError::for_unit(unit.name(), "no runnable methods"));
        }

        let mut seen = HashSet::new();
        let duplicates: Vec<InitializationError> = unit
            .methods()
            .iter()
            .filter(|m| !seen.insert(m.name()))
            .map(|m| InitializationError::for_unit(unit.name(), format!("duplicate test '{}'", m.name())))
            .collect();
        if !duplicates.is_empty() {
            return Err(InitializationError::merge(duplicates));
        }

        Ok(Self {
            methods: unit.methods().to_vec(),
            unit,
            description: OnceLock::new(),
        })
    }

    pub fn unit(&self) -> &TestUnit {
        &self.unit
    }

    fn describe(&self, method: &TestMethod) -> Description {
        method.describe(&self.unit)
    }

    fn invalidate(&mut self) {
        self.description = OnceLock::new();
    }
}

impl Runner for ClassRunner {
    fn description(&self) -> Description {
        self.description
            .get_or_init(|| {
                Description::suite(
                    self.unit.name(),
                    self.methods.iter().map(|m| self.describe(m)).collect(),
                )
            })
            .clone()
    }

    fn run(&self, notifier: &RunNotifier) {
        let description = self.description();
        notifier.fire_test_suite_started(&description);
        for (method, child) in self.methods.iter().zip(description.children()) {
            if method.is_ignored() {
                notifier.fire_test_ignored(child);
            } else {
                notifier.run_test(child, method.body().as_ref());
            }
        }
        notifier.fire_test_suite_finished(&description);
    }

    fn filter(&mut self, filter: &dyn Filter) -> Result<(), NoTestsRemainError> {
        let unit = self.unit.clone();
        self.methods.retain(|m| filter.should_run(&m.describe(&unit)));
        self.invalidate();
        if self.methods.is_empty() {
            Err(NoTestsRemainError(filter.describe()))
        } else {
            Ok(())
        }
    }

    fn sort(&mut self, sorter: &Sorter) {
        let unit = self.unit.clone();
        sorter.sort_by_description(&mut self.methods, |m| m.describe(&unit));
        self.invalidate();
    }

    fn order(&mut self, orderer: &Orderer) -> Result<(), InvalidOrderingError> {
        let unit = self.unit.clone();
        let methods = std::mem::take(&mut self.methods);
        self.methods = orderer.order_by_description(methods, |m| m.describe(&unit))?;
        self.invalidate();
        Ok(())
    }
}
