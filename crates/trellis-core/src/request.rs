//! Requests - immutable recipes for building a runner tree
//!
//! A [`Request`] does no work until [`Request::runner`] is called, and
//! builds a fresh tree every time. Filtering, sorting and ordering are
//! decorators wrapping another request, so they compose left to right and
//! a request can be run more than once with the same outcome.

use crate::builder::{AllDefaultPossibilities, BuildContext, RunnerBuilder};
use crate::computer::Computer;
use crate::description::Description;
use crate::error::{InitializationError, RequestError};
use crate::manipulation::{Filter, MatchDescription, Orderer, Ordering, Sorter};
use crate::runner::{ErrorReportingRunner, Runner, Suite};
use crate::unit::TestUnit;
use std::fmt;
use std::sync::Arc;

/// Something that can produce a runner tree on demand
pub trait RunnerSource: Send + Sync {
    fn materialize(&self) -> Result<Box<dyn Runner>, RequestError>;
}

/// A cheap-to-clone handle describing which tests to run and how
#[derive(Clone)]
pub struct Request {
    source: Arc<dyn RunnerSource>,
}

impl Request {
    pub fn from_source(source: impl RunnerSource + 'static) -> Self {
        Self {
            source: Arc::new(source),
        }
    }

    /// Run a batch of units composed by `computer`.
    ///
    /// If any unit cannot be built, the whole batch is replaced by one
    /// error-reporting runner naming every cause.
    pub fn classes(computer: &Computer, units: &[TestUnit]) -> Self {
        Self::classes_with(computer, Arc::new(AllDefaultPossibilities::new()), units)
    }

    /// Like [`classes`](Self::classes), resolving units through `builder`
    pub fn classes_with(
        computer: &Computer,
        builder: Arc<dyn RunnerBuilder>,
        units: &[TestUnit],
    ) -> Self {
        Self::from_source(ClassesSource {
            computer: *computer,
            builder,
            units: units.to_vec(),
        })
    }

    /// Run a batch of units serially
    pub fn units(units: &[TestUnit]) -> Self {
        Self::classes(&Computer::serial(), units)
    }

    /// Run one unit; a broken unit reports its own error
    pub fn unit(unit: TestUnit) -> Self {
        Self::from_source(UnitSource {
            unit,
            suite_methods: true,
        })
    }

    /// Run one unit, ignoring any legacy suite factory it declares
    pub fn unit_without_suite_method(unit: TestUnit) -> Self {
        Self::from_source(UnitSource {
            unit,
            suite_methods: false,
        })
    }

    /// Run a single test of a unit
    pub fn method(unit: TestUnit, method: &str) -> Self {
        let description = Description::test(unit.name(), method);
        Self::unit(unit).filter_with_description(description)
    }

    /// A request whose only test fails with `error`
    pub fn error_report(name: impl Into<String>, error: InitializationError) -> Self {
        let name = name.into();
        Self::from_fn(move || {
            Box::new(ErrorReportingRunner::new(name.clone(), error.clone())) as Box<dyn Runner>
        })
    }

    /// Wrap a runner factory
    pub fn from_fn<F>(factory: F) -> Self
    where
        F: Fn() -> Box<dyn Runner> + Send + Sync + 'static,
    {
        Self::from_source(FnSource(factory))
    }

    /// Build a fresh runner tree
    pub fn runner(&self) -> Result<Box<dyn Runner>, RequestError> {
        self.source.materialize()
    }

    /// Keep only tests the filter accepts
    pub fn filter_with(&self, filter: Arc<dyn Filter>) -> Self {
        Self::from_source(FilterRequest {
            inner: self.clone(),
            filter,
        })
    }

    /// Keep only the test equal to `description`
    pub fn filter_with_description(&self, description: Description) -> Self {
        self.filter_with(Arc::new(MatchDescription::new(description)))
    }

    /// Sort siblings at every level
    pub fn sort_with(&self, sorter: Sorter) -> Self {
        Self::from_source(SortRequest {
            inner: self.clone(),
            sorter,
        })
    }

    /// Reorder siblings at every level
    pub fn order_with(&self, ordering: Arc<dyn Ordering>) -> Self {
        Self::from_source(OrderingRequest {
            inner: self.clone(),
            orderer: Orderer::new(ordering),
        })
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Request")
    }
}

struct ClassesSource {
    computer: Computer,
    builder: Arc<dyn RunnerBuilder>,
    units: Vec<TestUnit>,
}

impl RunnerSource for ClassesSource {
    fn materialize(&self) -> Result<Box<dyn Runner>, RequestError> {
        match self.computer.suite(self.builder.as_ref(), &self.units) {
            Ok(suite) => Ok(Box::new(suite)),
            Err(error) => {
                tracing::debug!(
                    target: "trellis::request",
                    units = self.units.len(),
                    error = %error,
                    "Batch could not be built"
                );
                Ok(Box::new(ErrorReportingRunner::for_units(&self.units, error)))
            }
        }
    }
}

struct UnitSource {
    unit: TestUnit,
    suite_methods: bool,
}

impl RunnerSource for UnitSource {
    fn materialize(&self) -> Result<Box<dyn Runner>, RequestError> {
        let chain = AllDefaultPossibilities::new().with_suite_methods(self.suite_methods);
        let mut ctx = BuildContext::new(&chain);
        Ok(ctx.safe_runner_for_unit(&self.unit).unwrap_or_else(|| {
            Box::new(ErrorReportingRunner::new(
                self.unit.name(),
                InitializationError::for_unit(self.unit.name(), "no runner strategy applies"),
            ))
        }))
    }
}

struct FnSource<F>(F);

impl<F> RunnerSource for FnSource<F>
where
    F: Fn() -> Box<dyn Runner> + Send + Sync,
{
    fn materialize(&self) -> Result<Box<dyn Runner>, RequestError> {
        Ok((self.0)())
    }
}

/// Prunes the inner tree; nothing left means an empty suite
struct FilterRequest {
    inner: Request,
    filter: Arc<dyn Filter>,
}

impl RunnerSource for FilterRequest {
    fn materialize(&self) -> Result<Box<dyn Runner>, RequestError> {
        let mut runner = self.inner.runner()?;
        match runner.filter(self.filter.as_ref()) {
            Ok(()) => Ok(runner),
            Err(error) => {
                tracing::debug!(target: "trellis::request", error = %error, "Filter removed every test");
                Ok(Box::new(Suite::empty()))
            }
        }
    }
}

struct SortRequest {
    inner: Request,
    sorter: Sorter,
}

impl RunnerSource for SortRequest {
    fn materialize(&self) -> Result<Box<dyn Runner>, RequestError> {
        let mut runner = self.inner.runner()?;
        runner.sort(&self.sorter);
        Ok(runner)
    }
}

struct OrderingRequest {
    inner: Request,
    orderer: Orderer,
}

impl RunnerSource for OrderingRequest {
    fn materialize(&self) -> Result<Box<dyn Runner>, RequestError> {
        let mut runner = self.inner.runner()?;
        runner.order(&self.orderer)?;
        Ok(runner)
    }
}
