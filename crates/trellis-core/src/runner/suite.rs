//! Suite - composite runner over an ordered list of children

use crate::builder::BuildContext;
use crate::description::{Description, EMPTY_NAME};
use crate::error::{panic_message, InitializationError, InvalidOrderingError, NoTestsRemainError, TestError};
use crate::manipulation::{Filter, Orderer, Sorter};
use crate::notification::{EventRecorder, Failure, RunEvent, RunNotifier};
use crate::runner::Runner;
use crate::unit::TestUnit;
use rayon::prelude::*;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, OnceLock};

/// Name of the suite built over a batch of units with no parent unit
pub const ROOT_SUITE_NAME: &str = "(root)";

/// How a suite schedules its children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Execution {
    #[default]
    Serial,
    /// Children run on the rayon pool; their events are replayed in child order
    Parallel,
}

/// Runs child runners in order.
///
/// A child that panics past its own fault handling is reported as a failure
/// against its description, and the remaining children still run.
pub struct Suite {
    name: String,
    children: Vec<Box<dyn Runner>>,
    execution: Execution,
    description: OnceLock<Description>,
}

impl Suite {
    pub fn new(name: impl Into<String>, children: Vec<Box<dyn Runner>>) -> Self {
        Self {
            name: name.into(),
            children,
            execution: Execution::Serial,
            description: OnceLock::new(),
        }
    }

    /// A suite that runs nothing
    pub fn empty() -> Self {
        Self::new(EMPTY_NAME, Vec::new())
    }

    /// Build one child per unit through the builder chain
    pub fn from_units(
        ctx: &mut BuildContext<'_>,
        parent: Option<&TestUnit>,
        units: &[TestUnit],
    ) -> Result<Self, InitializationError> {
        let children = ctx.runners(parent, units)?;
        let name = parent.map_or(ROOT_SUITE_NAME, TestUnit::name);
        Ok(Self::new(name, children))
    }

    pub fn with_execution(mut self, execution: Execution) -> Self {
        self.execution = execution;
        self
    }

    pub fn children(&self) -> &[Box<dyn Runner>] {
        &self.children
    }

    pub fn execution(&self) -> Execution {
        self.execution
    }

    fn invalidate(&mut self) {
        self.description = OnceLock::new();
    }

    fn run_serial(&self, notifier: &RunNotifier) {
        for child in &self.children {
            run_child(child.as_ref(), notifier);
        }
    }

    fn run_parallel(&self, notifier: &RunNotifier) {
        let recordings: Vec<Vec<RunEvent>> = self
            .children
            .par_iter()
            .map(|child| {
                let recorder = Arc::new(EventRecorder::new());
                let local = RunNotifier::new();
                local.add_listener(recorder.clone());
                run_child(child.as_ref(), &local);
                recorder.take()
            })
            .collect();

        for event in recordings.iter().flatten() {
            notifier.replay(event);
        }
    }
}

fn run_child(child: &dyn Runner, notifier: &RunNotifier) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| child.run(notifier))) {
        let message = panic_message(payload);
        tracing::warn!(
            target: "trellis::runner",
            child = %child.description(),
            error = %message,
            "Child runner panicked; continuing with its siblings"
        );
        notifier.fire_test_failure(&Failure::new(
            child.description(),
            TestError::Panicked(message),
        ));
    }
}

impl Runner for Suite {
    fn description(&self) -> Description {
        self.description
            .get_or_init(|| {
                Description::suite(
                    self.name.clone(),
                    self.children.iter().map(|c| c.description()).collect(),
                )
            })
            .clone()
    }

    fn run(&self, notifier: &RunNotifier) {
        let description = self.description();
        notifier.fire_test_suite_started(&description);
        match self.execution {
            Execution::Serial => self.run_serial(notifier),
            Execution::Parallel => self.run_parallel(notifier),
        }
        notifier.fire_test_suite_finished(&description);
    }

    fn filter(&mut self, filter: &dyn Filter) -> Result<(), NoTestsRemainError> {
        self.children.retain_mut(|child| child.filter(filter).is_ok());
        self.invalidate();
        if self.children.is_empty() {
            Err(NoTestsRemainError(filter.describe()))
        } else {
            Ok(())
        }
    }

    fn sort(&mut self, sorter: &Sorter) {
        for child in &mut self.children {
            child.sort(sorter);
        }
        sorter.sort_by_description(&mut self.children, |c| c.description());
        self.invalidate();
    }

    fn order(&mut self, orderer: &Orderer) -> Result<(), InvalidOrderingError> {
        for child in &mut self.children {
            child.order(orderer)?;
        }
        let children = std::mem::take(&mut self.children);
        self.children = orderer.order_by_description(children, |c| c.description())?;
        self.invalidate();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::RunListener;
    use crate::result::RunResult;
    use std::sync::Mutex;

    /// Leaf runner that runs one named test with a scripted outcome
    struct Scripted {
        unit: &'static str,
        name: &'static str,
        outcome: fn() -> Result<(), TestError>,
    }

    impl Runner for Scripted {
        fn description(&self) -> Description {
            Description::test(self.unit, self.name)
        }

        fn run(&self, notifier: &RunNotifier) {
            notifier.run_test(&self.description(), self.outcome);
        }
    }

    struct Exploding;

    impl Runner for Exploding {
        fn description(&self) -> Description {
            Description::test("Broken", "explodes")
        }

        fn run(&self, _notifier: &RunNotifier) {
            panic!("runner bug");
        }
    }

    #[derive(Default)]
    struct Log(Mutex<Vec<String>>);

    impl RunListener for Log {
        fn test_started(&self, d: &Description) -> anyhow::Result<()> {
            self.0.lock().unwrap().push(format!("start {}", d));
            Ok(())
        }

        fn test_finished(&self, d: &Description) -> anyhow::Result<()> {
            self.0.lock().unwrap().push(format!("finish {}", d));
            Ok(())
        }
    }

    fn leaf(name: &'static str) -> Box<dyn Runner> {
        Box::new(Scripted {
            unit: "U",
            name,
            outcome: || Ok(()),
        })
    }

    #[test]
    fn test_description_is_memoized() {
        let suite = Suite::new("S", vec![leaf("a"), leaf("b")]);
        let first = suite.description();
        let second = suite.description();
        assert!(Description::ptr_eq(&first, &second));
        assert_eq!(first.test_count(), 2);
    }

    #[test]
    fn test_panicking_child_isolated_from_siblings() {
        let suite = Suite::new("S", vec![leaf("a"), Box::new(Exploding), leaf("c")]);
        let notifier = RunNotifier::new();
        let log = Arc::new(Log::default());
        let result = RunResult::new();
        notifier.add_first_listener(result.create_listener());
        notifier.add_listener(log.clone());

        suite.run(&notifier);

        assert_eq!(
            *log.0.lock().unwrap(),
            vec!["start a(U)", "finish a(U)", "start c(U)", "finish c(U)"]
        );
        assert_eq!(result.failure_count(), 1);
        assert_eq!(result.failures()[0].test_header(), "explodes(Broken)");
    }

    #[test]
    fn test_parallel_events_replayed_in_child_order() {
        let children: Vec<Box<dyn Runner>> = ["a", "b", "c", "d", "e", "f"]
            .into_iter()
            .map(leaf)
            .collect();
        let suite = Suite::new("S", children).with_execution(Execution::Parallel);
        let notifier = RunNotifier::new();
        let log = Arc::new(Log::default());
        notifier.add_listener(log.clone());

        suite.run(&notifier);

        let expected: Vec<String> = ["a", "b", "c", "d", "e", "f"]
            .iter()
            .flat_map(|n| [format!("start {}(U)", n), format!("finish {}(U)", n)])
            .collect();
        assert_eq!(*log.0.lock().unwrap(), expected);
    }

    #[test]
    fn test_empty_suite_describes_no_tests() {
        let suite = Suite::empty();
        assert_eq!(suite.description(), Description::empty());
        assert_eq!(suite.test_count(), 0);
    }
}
