//! Runner construction - a chain of strategies turning units into runners
//!
//! Every strategy answers "can I build a runner for this unit?". The
//! [`AllDefaultPossibilities`] chain asks them in priority order and the
//! first answer wins. Builders recurse into suite members through the
//! [`BuildContext`], which tracks the parent units currently being built so
//! a unit that contains itself is reported instead of looping forever.

pub mod chain;
pub mod registry;
pub mod strategies;

pub use chain::AllDefaultPossibilities;
pub use registry::{RunnerFactory, RunnerRegistry};
pub use strategies::{
    AnnotatedBuilder, DefaultBuilder, IgnoredBuilder, LegacyBuilder, NullBuilder, SuiteMethodBuilder,
};

use crate::error::InitializationError;
use crate::runner::{ErrorReportingRunner, Runner};
use crate::unit::TestUnit;

/// Deepest suite nesting accepted before giving up
pub const MAX_BUILD_DEPTH: usize = 64;

/// A strategy that may build a runner for a unit.
///
/// `Ok(None)` means the strategy does not apply; `Err` means it applies
/// but the unit is broken.
pub trait RunnerBuilder: Send + Sync {
    fn runner_for_unit(
        &self,
        unit: &TestUnit,
        ctx: &mut BuildContext<'_>,
    ) -> Result<Option<Box<dyn Runner>>, InitializationError>;
}

/// State threaded through one runner-tree construction
pub struct BuildContext<'a> {
    root: &'a dyn RunnerBuilder,
    parents: Vec<String>,
}

impl<'a> BuildContext<'a> {
    /// Start a construction that resolves units through `root`
    pub fn new(root: &'a dyn RunnerBuilder) -> Self {
        Self {
            root,
            parents: Vec::new(),
        }
    }

    /// Number of suites currently being built
    pub fn depth(&self) -> usize {
        self.parents.len()
    }

    pub fn runner_for_unit(
        &mut self,
        unit: &TestUnit,
    ) -> Result<Option<Box<dyn Runner>>, InitializationError> {
        let root = self.root;
        root.runner_for_unit(unit, self)
    }

    /// Like [`runner_for_unit`](Self::runner_for_unit), but a broken unit
    /// becomes an [`ErrorReportingRunner`] instead of an error
    pub fn safe_runner_for_unit(&mut self, unit: &TestUnit) -> Option<Box<dyn Runner>> {
        match self.runner_for_unit(unit) {
            Ok(runner) => runner,
            Err(error) => {
                tracing::debug!(
                    target: "trellis::builder",
                    unit = unit.name(),
                    error = %error,
                    "Unit could not be built; reporting it as a failure"
                );
                Some(Box::new(ErrorReportingRunner::new(unit.name(), error)))
            }
        }
    }

    /// Build one runner per unit, children of `parent`.
    ///
    /// Every unit is visited even when an earlier one is broken; the batch
    /// then fails with one error carrying every cause.
    pub fn runners(
        &mut self,
        parent: Option<&TestUnit>,
        units: &[TestUnit],
    ) -> Result<Vec<Box<dyn Runner>>, InitializationError> {
        if let Some(parent) = parent {
            self.enter(parent)?;
        }
        let built = self.build_all(units);
        if parent.is_some() {
            self.parents.pop();
        }
        built
    }

    fn enter(&mut self, parent: &TestUnit) -> Result<(), InitializationError> {
        if self.parents.iter().any(|name| name == parent.name()) {
            return Err(InitializationError::new(format!(
                "unit '{}' (possibly indirectly) contains itself",
                parent.name()
            )));
        }
        if self.parents.len() >= MAX_BUILD_DEPTH {
            return Err(InitializationError::for_unit(
                parent.name(),
                format!("suites nested deeper than {} levels", MAX_BUILD_DEPTH),
            ));
        }
        self.parents.push(parent.name().to_string());
        Ok(())
    }

    fn build_all(&mut self, units: &[TestUnit]) -> Result<Vec<Box<dyn Runner>>, InitializationError> {
        let mut runners = Vec::with_capacity(units.len());
        let mut causes = Vec::new();

        for unit in units {
            match self.safe_runner_for_unit(unit) {
                Some(runner) => {
                    if let Some(error) = runner.initialization_error() {
                        causes.push(error.clone());
                    }
                    runners.push(runner);
                }
                None => causes.push(InitializationError::for_unit(
                    unit.name(),
                    "no runner strategy applies",
                )),
            }
        }

        if causes.is_empty() {
            Ok(runners)
        } else {
            Err(InitializationError::merge(causes))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn broken(name: &str) -> TestUnit {
        TestUnit::builder(name).build()
    }

    fn healthy(name: &str) -> TestUnit {
        TestUnit::builder(name).test("ok", || Ok(())).build()
    }

    #[test]
    fn test_batch_collects_every_cause() {
        let chain = AllDefaultPossibilities::new();
        let mut ctx = BuildContext::new(&chain);

        let err = ctx
            .runners(None, &[broken("A"), healthy("B"), broken("C")])
            .err()
            .unwrap();

        assert_eq!(
            err.causes(),
            &["unit 'A': no runnable methods", "unit 'C': no runnable methods"]
        );
    }

    #[test]
    fn test_healthy_batch_keeps_unit_order() {
        let chain = AllDefaultPossibilities::new();
        let mut ctx = BuildContext::new(&chain);

        let runners = ctx.runners(None, &[healthy("B"), healthy("A")]).unwrap();
        let names: Vec<String> = runners
            .iter()
            .map(|r| r.description().display_name().to_string())
            .collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[test]
    fn test_no_applicable_strategy_is_a_cause() {
        struct Nothing;
        impl RunnerBuilder for Nothing {
            fn runner_for_unit(
                &self,
                _unit: &TestUnit,
                _ctx: &mut BuildContext<'_>,
            ) -> Result<Option<Box<dyn Runner>>, InitializationError> {
                Ok(None)
            }
        }

        let mut ctx = BuildContext::new(&Nothing);
        let err = ctx.runners(None, &[healthy("A")]).err().unwrap();
        assert_eq!(err.to_string(), "unit 'A': no runner strategy applies");
    }

    #[test]
    fn test_guard_rejects_revisit_and_unwinds() {
        let chain = AllDefaultPossibilities::new();
        let mut ctx = BuildContext::new(&chain);
        let parent = healthy("P");

        ctx.enter(&parent).unwrap();
        let err = ctx.runners(Some(&parent), &[healthy("A")]).err().unwrap();
        assert_eq!(err.to_string(), "unit 'P' (possibly indirectly) contains itself");
        assert_eq!(ctx.depth(), 1);
    }

    #[test]
    fn test_guard_limits_depth() {
        let chain = AllDefaultPossibilities::new();
        let mut ctx = BuildContext::new(&chain);
        for level in 0..MAX_BUILD_DEPTH {
            ctx.enter(&healthy(&format!("L{}", level))).unwrap();
        }

        let err = ctx.enter(&healthy("deep")).err().unwrap();
        assert!(err.to_string().contains("nested deeper than 64 levels"));
    }
}
