//! LegacyRunner - adapter for tests written in the older convention
//!
//! The older convention has no notion of assumptions: an assumption
//! violation raised by a legacy case is reported as an ordinary failure.

use crate::description::Description;
use crate::error::{InitializationError, InvalidOrderingError, NoTestsRemainError, TestError};
use crate::manipulation::{Filter, Orderer, Sorter};
use crate::notification::RunNotifier;
use crate::runner::Runner;
use crate::unit::{LegacyTest, TestUnit};
use std::sync::OnceLock;

pub struct LegacyRunner {
    test: LegacyTest,
    description: OnceLock<Description>,
}

impl LegacyRunner {
    /// Wrap a legacy test tree. Adapted modern units must be unwrapped first.
    pub fn new(test: LegacyTest) -> Result<Self, InitializationError> {
        if test.contains_units() {
            return Err(InitializationError::new(
                "legacy runner cannot execute adapted units directly",
            ));
        }
        Ok(Self {
            test,
            description: OnceLock::new(),
        })
    }

    /// Treat every method of a legacy-style unit as a legacy case
    pub fn for_unit(unit: &TestUnit) -> Result<Self, InitializationError> {
        if unit.methods().is_empty() {
            return Err(InitializationError::for_unit(unit.name(), "no legacy test cases"));
        }
        let cases = unit
            .methods()
            .iter()
            .map(|m| LegacyTest::from_method(unit, m))
            .collect();
        Self::new(LegacyTest::suite(unit.name(), cases))
    }

    fn invalidate(&mut self) {
        self.description = OnceLock::new();
    }
}

fn describe(test: &LegacyTest) -> Description {
    match test {
        LegacyTest::Case {
            unit,
            name,
            categories,
            ..
        } => Description::test_with_categories(unit, name, categories.clone()),
        LegacyTest::Suite { name, tests } => {
            Description::suite(name.clone(), tests.iter().map(describe).collect())
        }
        LegacyTest::Unit(unit) => unit.describe(),
    }
}

fn run_legacy(test: &LegacyTest, description: &Description, notifier: &RunNotifier) {
    match test {
        LegacyTest::Case { ignored: Some(_), .. } => notifier.fire_test_ignored(description),
        LegacyTest::Case { body, .. } => notifier.run_test(description, || {
            body().map_err(|err| match err {
                TestError::AssumptionViolated(message) => {
                    TestError::Assertion(format!("assumption violated: {}", message))
                }
                other => other,
            })
        }),
        LegacyTest::Suite { tests, .. } => {
            for (child, child_description) in tests.iter().zip(description.children()) {
                run_legacy(child, child_description, notifier);
            }
        }
        LegacyTest::Unit(_) => {}
    }
}

fn prune(test: LegacyTest, filter: &dyn Filter) -> Option<LegacyTest> {
    match test {
        LegacyTest::Suite { name, tests } => {
            let kept: Vec<LegacyTest> = tests.into_iter().filter_map(|t| prune(t, filter)).collect();
            if kept.is_empty() {
                None
            } else {
                Some(LegacyTest::Suite { name, tests: kept })
            }
        }
        leaf => filter.should_run(&describe(&leaf)).then_some(leaf),
    }
}

fn sort_tree(test: &mut LegacyTest, sorter: &Sorter) {
    if let LegacyTest::Suite { tests, .. } = test {
        for child in tests.iter_mut() {
            sort_tree(child, sorter);
        }
        sorter.sort_by_description(tests, describe);
    }
}

fn order_tree(test: &mut LegacyTest, orderer: &Orderer) -> Result<(), InvalidOrderingError> {
    if let LegacyTest::Suite { tests, .. } = test {
        for child in tests.iter_mut() {
            order_tree(child, orderer)?;
        }
        let children = std::mem::take(tests);
        *tests = orderer.order_by_description(children, describe)?;
    }
    Ok(())
}

impl Runner for LegacyRunner {
    fn description(&self) -> Description {
        self.description.get_or_init(|| describe(&self.test)).clone()
    }

    fn run(&self, notifier: &RunNotifier) {
        run_legacy(&self.test, &self.description(), notifier);
    }

    fn filter(&mut self, filter: &dyn Filter) -> Result<(), NoTestsRemainError> {
        match prune(self.test.clone(), filter) {
            Some(kept) => {
                self.test = kept;
                self.invalidate();
                Ok(())
            }
            None => Err(NoTestsRemainError(filter.describe())),
        }
    }

    fn sort(&mut self, sorter: &Sorter) {
        sort_tree(&mut self.test, sorter);
        self.invalidate();
    }

    fn order(&mut self, orderer: &Orderer) -> Result<(), InvalidOrderingError> {
        order_tree(&mut self.test, orderer)?;
        self.invalidate();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manipulation::{CategoryFilter, NameFilter};
    use crate::unit::TestMethod;
    use crate::result::RunResult;

    fn legacy_suite() -> LegacyTest {
        LegacyTest::suite(
            "MoneyTest",
            vec![
                LegacyTest::case("MoneyTest", "testAdd", || Ok(())),
                LegacyTest::case("MoneyTest", "testOffline", || {
                    Err(TestError::AssumptionViolated("no rates service".into()))
                }),
                LegacyTest::suite(
                    "Currency",
                    vec![LegacyTest::case("CurrencyTest", "testParse", || Ok(()))],
                ),
            ],
        )
    }

    #[test]
    fn test_assumptions_count_as_failures() {
        let runner = LegacyRunner::new(legacy_suite()).unwrap();
        let notifier = RunNotifier::new();
        let result = RunResult::new();
        notifier.add_listener(result.create_listener());

        runner.run(&notifier);

        assert_eq!(result.run_count(), 3);
        assert_eq!(result.assumption_failure_count(), 0);
        assert_eq!(result.failure_count(), 1);
        assert_eq!(
            result.failures()[0].message(),
            "assumption violated: no rates service"
        );
    }

    #[test]
    fn test_filter_prunes_nested_suites() {
        let mut runner = LegacyRunner::new(legacy_suite()).unwrap();
        runner.filter(&NameFilter::new("testAdd")).unwrap();

        let description = runner.description();
        assert_eq!(description.test_count(), 1);
        assert_eq!(description.children().len(), 1);
        assert!(runner.filter(&NameFilter::new("nothing")).is_err());
        assert_eq!(runner.test_count(), 1);
    }

    #[test]
    fn test_units_must_be_unwrapped_first() {
        let tree = LegacyTest::suite("S", vec![LegacyTest::Unit(TestUnit::builder("M").build())]);
        assert!(LegacyRunner::new(tree).is_err());
    }

    #[test]
    fn test_ignored_method_of_legacy_unit_is_skipped() {
        let unit = TestUnit::builder("Old")
            .legacy()
            .test("testOk", || Ok(()))
            .method(
                TestMethod::new("testSkipped", || Err(TestError::Assertion("must not run".into())))
                    .ignore("later"),
            )
            .build();
        let runner = LegacyRunner::for_unit(&unit).unwrap();
        let notifier = RunNotifier::new();
        let result = RunResult::new();
        notifier.add_listener(result.create_listener());

        runner.run(&notifier);

        assert_eq!(result.run_count(), 1);
        assert_eq!(result.failure_count(), 0);
        assert_eq!(result.ignore_count(), 1);
    }

    #[test]
    fn test_category_filter_sees_unit_and_method_categories() {
        let unit = TestUnit::builder("Old")
            .legacy()
            .category("fast")
            .test("testA", || Ok(()))
            .method(TestMethod::new("testB", || Ok(())).category("db"))
            .build();

        let mut fast = LegacyRunner::for_unit(&unit).unwrap();
        fast.filter(&CategoryFilter::include(["fast"])).unwrap();
        assert_eq!(fast.test_count(), 2);

        let mut db = LegacyRunner::for_unit(&unit).unwrap();
        db.filter(&CategoryFilter::include(["db"])).unwrap();
        let description = db.description();
        assert_eq!(description.tests()[0].display_name(), "testB(Old)");
        assert_eq!(description.test_count(), 1);
    }
}
